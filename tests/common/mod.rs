#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use spawnpool::PoolConfig;

/// Polls `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Fast spawning, slow expiry.
pub fn config(batch_size: usize, standby: usize, maximum: usize) -> PoolConfig {
    PoolConfig {
        batch_size,
        standby_workers: standby,
        max_workers: maximum,
        spawn_interval: Duration::from_millis(5),
        worker_expiry: Duration::from_secs(10),
        queue_capacity: 256,
        ..PoolConfig::default()
    }
}
