use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use crossbeam_utils::CachePadded;
use log::{debug, error, trace};

use super::scaling::target_workers;
use super::worker::Worker;
use crate::{PoolError, Result};
use crate::config::{PoolConfig, Settings};
use crate::panic::{PanicHandler, payload_message};
use crate::queue::{Task, TaskQueue};

/// State shared by the pool handle, the spawner and every worker.
pub(super) struct Shared {
    pub(super) queue: Arc<dyn TaskQueue>,
    closed: AtomicBool,
    // only incremented under `spawn_scope`
    workers: CachePadded<AtomicUsize>,
    settings: RwLock<Settings>,
    panic_handler: RwLock<PanicHandler>,
    // capacity 1, a pending wake-up absorbs further ones
    signal: Sender<()>,
    spawn_scope: Mutex<()>,
    thread_name: String,
    next_worker_id: AtomicUsize,
    epoch: Instant,
    // micros since `epoch`
    last_access: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl Shared {
    pub(super) fn new(
        queue: Arc<dyn TaskQueue>,
        config: &PoolConfig,
        panic_handler: PanicHandler,
        signal: Sender<()>,
    ) -> Shared {
        Shared {
            queue,
            closed: AtomicBool::new(false),
            workers: CachePadded::new(AtomicUsize::new(0)),
            settings: RwLock::new(config.settings()),
            panic_handler: RwLock::new(panic_handler),
            signal,
            spawn_scope: Mutex::new(()),
            thread_name: config.thread_name.clone(),
            next_worker_id: AtomicUsize::new(0),
            epoch: Instant::now(),
            last_access: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        }
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns true for the one caller that flipped the flag.
    pub(super) fn mark_closed(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(super) fn settings(&self) -> Settings {
        *self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *settings);
    }

    pub(super) fn set_panic_handler(&self, handler: PanicHandler) {
        *self
            .panic_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Hands a payload to the panic handler exactly once.
    ///
    /// A panic raised by the handler itself is logged and swallowed, it never
    /// reaches the handler again.
    pub(super) fn handle_panic(&self, payload: Box<dyn Any + Send>) {
        // cloned out so a handler may replace itself without deadlocking
        let handler = self
            .panic_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Err(nested) = panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
            error!("panic handler panicked: {}", payload_message(nested.as_ref()));
        }
    }

    /// Wakes the spawner. Dropped if a wake-up is already pending.
    pub(super) fn notify(&self) {
        let _ = self.signal.try_send(());
    }

    pub(super) fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub(super) fn next_worker_id(&self) -> usize {
        self.next_worker_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn worker_count(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    pub(super) fn acquire_worker(&self) {
        self.workers.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn release_worker(&self) {
        self.workers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Gives back one worker slot if the pool has more workers than it needs
    /// or is closed. The check and the decrement are one atomic step.
    pub(super) fn try_retire(&self) -> bool {
        let s = self.settings();
        let closed = self.is_closed();
        self.workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                let surplus = n > s.standby_workers || (s.max_workers > 0 && n > s.max_workers);
                (n > 0 && (closed || surplus)).then(|| n - 1)
            })
            .is_ok()
    }

    pub(super) fn touch(&self) {
        let micros = self.epoch.elapsed().as_micros() as u64;
        self.last_access.store(micros, Ordering::Relaxed);
    }

    pub(super) fn last_access(&self) -> Instant {
        self.epoch + Duration::from_micros(self.last_access.load(Ordering::Relaxed))
    }

    pub(super) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub(super) fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// Runs a task on the calling thread, routing a panic to the handler.
    pub(super) fn run_task(&self, task: Task) {
        trace!("running task");
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                self.handle_panic(payload);
            }
        }
    }

    /// Launches workers until the scaling target for the current queue depth is met.
    pub(super) fn spawn_to_target(self: &Arc<Self>) -> Result<usize> {
        let _scope = self
            .spawn_scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let s = self.settings();
        let target = target_workers(
            self.queue.count(),
            s.batch_size,
            s.standby_workers,
            s.max_workers,
        );
        self.launch_up_to(target)
    }

    /// Launches workers until `n` are running, ignoring the scaling policy.
    pub(super) fn pre_alloc(self: &Arc<Self>, n: usize) -> Result<usize> {
        let _scope = self
            .spawn_scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        self.launch_up_to(n)
    }

    fn launch_up_to(self: &Arc<Self>, target: usize) -> Result<usize> {
        let current = self.worker_count();
        let missing = target.saturating_sub(current);
        for _ in 0..missing {
            Worker::spawn(Arc::clone(self))?;
        }
        if missing > 0 {
            debug!("spawned {} workers ({} -> {})", missing, current, target);
        }
        Ok(missing)
    }
}
