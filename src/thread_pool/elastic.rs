use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use log::info;

use super::ThreadPool;
use super::shared::Shared;
use super::spawner;
use crate::config::{MIN_WORKER_EXPIRY, PoolConfig};
use crate::panic::{PanicHandler, default_panic_handler};
use crate::queue::{BoundedTaskQueue, TaskQueue};
use crate::{PoolError, Result};

/// A thread pool that sizes itself to its backlog.
///
/// Every submission wakes a spawner thread which launches one worker per
/// `batch_size` queued tasks, keeping at least `standby_workers` and at most
/// `max_workers` alive. Workers idle for longer than `worker_expiry` retire
/// while the pool has more of them than it needs.
///
/// A panicking task is caught on its worker and handed to the panic handler;
/// the worker keeps running.
///
/// Dropping the pool closes it. Workers finish what they are running and
/// retire on their own.
pub struct ElasticThreadPool {
    shared: Arc<Shared>,
}

impl ElasticThreadPool {
    /// Creates a pool over `queue` with the default config.
    ///
    /// # Errors
    ///
    /// Returns an error if the spawner thread fails to start.
    pub fn new(queue: Arc<dyn TaskQueue>) -> Result<Self> {
        ElasticThreadPool::with_config(queue, PoolConfig::default())
    }

    /// Creates a pool over `queue`.
    ///
    /// The spawner is woken once right away so standby workers come up
    /// before the first submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the spawner thread fails to start.
    pub fn with_config(queue: Arc<dyn TaskQueue>, config: PoolConfig) -> Result<Self> {
        let (signal, wake) = bounded(1);
        let shared = Arc::new(Shared::new(queue, &config, default_panic_handler(), signal));
        spawner::start(&shared, wake)?;
        shared.notify();
        Ok(ElasticThreadPool { shared })
    }

    /// Creates a pool with its own `BoundedTaskQueue` of `config.queue_capacity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spawner thread fails to start.
    pub fn from_config(config: PoolConfig) -> Result<Self> {
        let queue = Arc::new(BoundedTaskQueue::new(config.queue_capacity));
        ElasticThreadPool::with_config(queue, config)
    }

    /// Starts workers until `n` are running, whatever the backlog.
    ///
    /// Returns how many were started. Extra workers retire after
    /// `worker_expiry` like any other.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolClosed` on a closed pool, or an I/O error if a
    /// worker thread fails to start.
    pub fn pre_alloc_worker_size(&self, n: usize) -> Result<usize> {
        self.shared.pre_alloc(n)
    }

    /// Whether `close` also closes the task queue.
    pub fn set_close_queue_on_close(&self, close_queue: bool) -> &Self {
        self.shared.update_settings(|s| s.close_queue_on_close = close_queue);
        self
    }

    /// Sets the number of queued tasks per worker. Zero counts as one.
    pub fn set_batch_size(&self, batch_size: usize) -> &Self {
        self.shared.update_settings(|s| s.batch_size = batch_size);
        self.shared.notify();
        self
    }

    /// Sets how many workers stay alive while idle.
    pub fn set_standby_workers(&self, standby: usize) -> &Self {
        self.shared.update_settings(|s| s.standby_workers = standby);
        self.shared.notify();
        self
    }

    /// Sets the worker ceiling, zero for none.
    ///
    /// Lowering it does not stop running workers, the surplus retires once idle.
    pub fn set_max_workers(&self, maximum: usize) -> &Self {
        self.shared.update_settings(|s| s.max_workers = maximum);
        self.shared.notify();
        self
    }

    /// Sets the pause between two spawn evaluations.
    pub fn set_spawn_interval(&self, interval: Duration) -> &Self {
        self.shared.update_settings(|s| s.spawn_interval = interval);
        self
    }

    /// Sets the idle time after which a surplus worker retires.
    ///
    /// Workers pick up the new value on their next wait. Values under 10ms
    /// are raised to 10ms.
    pub fn set_worker_expiry(&self, expiry: Duration) -> &Self {
        self.shared.update_settings(|s| s.worker_expiry = expiry.max(MIN_WORKER_EXPIRY));
        self.shared.notify();
        self
    }

    /// Replaces the handler that receives panics from tasks.
    pub fn set_panic_handler<H>(&self, handler: H) -> &Self
    where
        H: Fn(Box<dyn std::any::Any + Send>) + Send + Sync + 'static,
    {
        let handler: PanicHandler = Arc::new(handler);
        self.shared.set_panic_handler(handler);
        self
    }

    /// Number of live workers
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count()
    }

    /// Number of tasks waiting in the queue
    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.count()
    }

    /// Number of tasks that ran to completion
    pub fn completed_tasks(&self) -> u64 {
        self.shared.completed()
    }

    /// Number of tasks that panicked
    pub fn panicked_tasks(&self) -> u64 {
        self.shared.panicked()
    }

    /// When a worker last started waiting for work.
    pub fn last_access(&self) -> Instant {
        self.shared.last_access()
    }

    /// The queue this pool feeds from
    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.shared.queue
    }
}

impl ThreadPool for ElasticThreadPool {
    fn schedule<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        let res = self.shared.queue.offer(Box::new(job));
        self.shared.notify();
        res
    }

    fn schedule_with_timeout<F>(&self, job: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        let res = self.shared.queue.offer_timeout(Box::new(job), timeout);
        self.shared.notify();
        res
    }

    fn close(&self) {
        if !self.shared.mark_closed() {
            return;
        }
        info!("closing pool with {} workers", self.shared.worker_count());
        if self.shared.settings().close_queue_on_close {
            self.shared.queue.close();
        }
        // lets the spawner observe the flag and stop
        self.shared.notify();
    }

    fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl Drop for ElasticThreadPool {
    fn drop(&mut self) {
        self.close();
    }
}
