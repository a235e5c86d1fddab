mod elastic;
mod scaling;
mod shared;
mod spawner;
mod worker;

use std::time::Duration;

use crate::Result;

pub use self::elastic::ElasticThreadPool;
pub use self::scaling::target_workers;

/// Thread pool
pub trait ThreadPool: Send + Sync {
    /// Queues a job for execution on one of the pool's threads.
    ///
    /// Returns once the job is queued, never waits for it to run. If the job
    /// panics the pool continues to operate, the panic goes to the pool's
    /// panic handler and not to the caller.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolClosed` after `close`, otherwise whatever the task
    /// queue rejects the job with.
    fn schedule<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static;

    /// Like `schedule`, but waits at most `timeout` for room in the queue.
    ///
    /// The timeout bounds queueing only, not execution.
    fn schedule_with_timeout<F>(&self, job: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() + Send + 'static;

    /// Stops accepting jobs. Calling it again is a no-op.
    fn close(&self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;
}
