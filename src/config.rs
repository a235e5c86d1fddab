use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Shortest idle wait a worker is given, so a zero expiry cannot busy-spin.
pub(crate) const MIN_WORKER_EXPIRY: Duration = Duration::from_millis(10);

/// Pool settings.
///
/// Loadable from TOML, every field is optional:
///
/// ```toml
/// batch_size = 5
/// standby_workers = 2
/// max_workers = 64
/// spawn_interval_ms = 100
/// worker_expiry_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Close the task queue when the pool is closed
    pub close_queue_on_close: bool,
    /// Queued tasks per worker. Zero is treated as one
    pub batch_size: usize,
    /// Workers kept resident while idle
    pub standby_workers: usize,
    /// Worker ceiling, zero means unbounded
    pub max_workers: usize,
    /// Minimum pause between two spawn evaluations
    #[serde(rename = "spawn_interval_ms", with = "millis")]
    pub spawn_interval: Duration,
    /// Idle time after which a worker may retire. Raised to 10ms if shorter
    #[serde(rename = "worker_expiry_ms", with = "millis")]
    pub worker_expiry: Duration,
    /// Capacity of the queue built by `ElasticThreadPool::from_config`
    pub queue_capacity: usize,
    /// Prefix of worker thread names
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            close_queue_on_close: true,
            batch_size: 5,
            standby_workers: 5,
            max_workers: 1000,
            spawn_interval: Duration::from_millis(100),
            worker_expiry: Duration::from_millis(5000),
            queue_capacity: 1024,
            thread_name: "spawnpool-worker".to_owned(),
        }
    }
}

impl PoolConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Config` on malformed input.
    pub fn from_toml_str(s: &str) -> Result<PoolConfig> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// It propagates I/O errors while reading and `PoolError::Config` on malformed input.
    pub fn load(path: impl AsRef<Path>) -> Result<PoolConfig> {
        let text = fs::read_to_string(path)?;
        PoolConfig::from_toml_str(&text)
    }

    pub(crate) fn settings(&self) -> Settings {
        Settings {
            close_queue_on_close: self.close_queue_on_close,
            batch_size: self.batch_size,
            standby_workers: self.standby_workers,
            max_workers: self.max_workers,
            spawn_interval: self.spawn_interval,
            worker_expiry: self.worker_expiry.max(MIN_WORKER_EXPIRY),
        }
    }
}

/// The live, copyable part of the config read by workers and the spawner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settings {
    pub close_queue_on_close: bool,
    pub batch_size: usize,
    pub standby_workers: usize,
    pub max_workers: usize,
    pub spawn_interval: Duration,
    pub worker_expiry: Duration,
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
