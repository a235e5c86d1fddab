use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError, bounded, unbounded,
};

use super::{Consumed, Task, TaskQueue};
use crate::{PoolError, Result};

/// Channel backed task queue.
///
/// Closing drops the only long-lived sender, so consumers see the channel
/// disconnect once the remaining tasks have been drained.
pub struct BoundedTaskQueue {
    sender: RwLock<Option<Sender<Task>>>,
    receiver: Receiver<Task>,
    capacity: Option<usize>,
}

impl BoundedTaskQueue {
    /// Creates a queue holding at most `capacity` tasks.
    ///
    /// A capacity of zero makes every offer a rendezvous with a waiting worker.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        BoundedTaskQueue {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity: Some(capacity),
        }
    }

    /// Creates a queue without a capacity limit. Offers never fail with `QueueFull`.
    pub fn unbounded() -> Self {
        let (sender, receiver) = unbounded();
        BoundedTaskQueue {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity: None,
        }
    }

    /// Maximum number of queued tasks, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    // Cloned out so a blocking send never holds the lock `close` needs.
    fn sender(&self) -> Option<Sender<Task>> {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TaskQueue for BoundedTaskQueue {
    fn offer(&self, task: Task) -> Result<()> {
        let sender = self.sender().ok_or(PoolError::QueueClosed)?;
        sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => PoolError::QueueFull,
            TrySendError::Disconnected(_) => PoolError::QueueClosed,
        })
    }

    fn offer_timeout(&self, task: Task, timeout: Duration) -> Result<()> {
        let sender = self.sender().ok_or(PoolError::QueueClosed)?;
        sender.send_timeout(task, timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(_) => PoolError::Timeout,
            SendTimeoutError::Disconnected(_) => PoolError::QueueClosed,
        })
    }

    fn count(&self) -> usize {
        self.receiver.len()
    }

    fn take(&self, timeout: Duration) -> Consumed {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => Consumed::Task(task),
            Err(RecvTimeoutError::Timeout) => Consumed::Idle,
            Err(RecvTimeoutError::Disconnected) => Consumed::Exhausted,
        }
    }

    fn close(&self) {
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
