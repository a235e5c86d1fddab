use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use log::{debug, warn};

use super::shared::Shared;
use crate::Result;
use crate::queue::Consumed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Active,
    Retired,
}

/// Owns one unit of the pool's worker count and gives it back on drop,
/// whichever way the worker thread ends.
struct CountGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl CountGuard {
    fn acquire(shared: Arc<Shared>) -> CountGuard {
        shared.acquire_worker();
        CountGuard {
            shared,
            armed: true,
        }
    }

    // The unit was already given back by `Shared::try_retire`.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CountGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.release_worker();
        }
    }
}

pub(super) struct Worker {
    id: usize,
    guard: CountGuard,
}

impl Worker {
    /// Counts a new worker and starts its thread.
    ///
    /// If the thread cannot be started the closure is dropped with the guard
    /// inside, so the count is restored.
    pub(super) fn spawn(shared: Arc<Shared>) -> Result<()> {
        let id = shared.next_worker_id();
        let name = format!("{}-{}", shared.thread_name(), id);
        let worker = Worker {
            id,
            guard: CountGuard::acquire(shared),
        };
        thread::Builder::new().name(name).spawn(move || worker.run())?;
        Ok(())
    }

    fn run(mut self) {
        debug!("worker {} started", self.id);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_loop()));
        match outcome {
            Ok(()) => debug!("worker {} retired", self.id),
            Err(payload) => {
                let Worker { id, guard } = self;
                let shared = Arc::clone(&guard.shared);
                // give the slot back before waking the spawner so it sees the gap
                drop(guard);
                shared.notify();
                warn!("worker {} exited abnormally", id);
                shared.handle_panic(payload);
            }
        }
    }

    fn run_loop(&mut self) {
        let mut state = WorkerState::Active;
        while state == WorkerState::Active {
            state = self.step();
        }
    }

    fn step(&mut self) -> WorkerState {
        let shared = Arc::clone(&self.guard.shared);
        shared.touch();

        let expiry = shared.settings().worker_expiry;
        match shared.queue.take(expiry) {
            Consumed::Task(task) => {
                shared.run_task(task);
                WorkerState::Active
            }
            Consumed::Idle => {
                if shared.try_retire() {
                    self.guard.disarm();
                    // a task queued while we were deciding must not be left without a worker
                    if shared.queue.count() > 0 {
                        shared.notify();
                    }
                    WorkerState::Retired
                } else {
                    WorkerState::Active
                }
            }
            Consumed::Exhausted => WorkerState::Retired,
        }
    }
}
