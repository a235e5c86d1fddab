use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread;

use crossbeam_channel::Receiver;
use log::{debug, error};

use super::shared::Shared;
use crate::Result;
use crate::panic::default_panic_handler;

/// Starts the spawner thread.
///
/// It only holds a weak reference, so once the pool and all workers are gone
/// the signal sender is dropped and the loop ends.
pub(super) fn start(shared: &Arc<Shared>, signal: Receiver<()>) -> Result<()> {
    let pool = Arc::downgrade(shared);
    thread::Builder::new()
        .name(format!("{}-spawner", shared.thread_name()))
        .spawn(move || run(pool, signal))?;
    Ok(())
}

fn run(pool: Weak<Shared>, signal: Receiver<()>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| spawn_loop(&pool, &signal)));
    if let Err(payload) = outcome {
        match pool.upgrade() {
            Some(shared) => shared.handle_panic(payload),
            None => default_panic_handler()(payload),
        }
    }
    debug!("spawner stopped");
}

fn spawn_loop(pool: &Weak<Shared>, signal: &Receiver<()>) {
    for () in signal.iter() {
        let Some(shared) = pool.upgrade() else {
            break;
        };
        if shared.is_closed() {
            break;
        }

        if !shared.queue.is_closed() {
            if let Err(e) = shared.spawn_to_target() {
                error!("failed to spawn worker: {}", e);
            }
        }

        let pause = shared.settings().spawn_interval;
        drop(shared);
        thread::sleep(pause);
    }
}
