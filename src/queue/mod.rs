use std::time::Duration;

use crate::Result;

mod bounded;

pub use self::bounded::BoundedTaskQueue;

/// A unit of work handed to the pool.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of waiting on a queue for one task.
pub enum Consumed {
    /// A task was taken off the queue
    Task(Task),
    /// Nothing arrived before the timeout
    Idle,
    /// The queue is closed and every queued task has been handed out
    Exhausted,
}

/// Task queue consumed by the pool.
///
/// The pool only relies on this contract; buffering and backpressure are up to
/// the implementation. All methods take `&self`, implementations synchronize
/// internally.
pub trait TaskQueue: Send + Sync {
    /// Enqueues a task without blocking.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::QueueFull` when there is no free slot and
    /// `PoolError::QueueClosed` once the queue has been closed.
    fn offer(&self, task: Task) -> Result<()>;

    /// Enqueues a task, waiting at most `timeout` for a free slot.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Timeout` when no slot frees up in time and
    /// `PoolError::QueueClosed` once the queue has been closed.
    fn offer_timeout(&self, task: Task, timeout: Duration) -> Result<()>;

    /// Current depth. Approximate under concurrency.
    fn count(&self) -> usize;

    /// Waits at most `timeout` for the next task.
    fn take(&self, timeout: Duration) -> Consumed;

    /// Closes the queue. Later offers fail, already queued tasks can still be taken.
    fn close(&self);

    /// Whether `close` has been called.
    fn is_closed(&self) -> bool;
}
