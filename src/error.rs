use std::fmt;
use std::io;

#[derive(Debug)]

/// The pool error type
pub enum PoolError {
    /// Submission after the pool was closed
    PoolClosed,

    /// The task queue has no free slot
    QueueFull,

    /// The task queue was closed
    QueueClosed,

    /// A timed submission did not get a queue slot in time
    Timeout,

    /// IO Error, raised when a worker thread cannot be spawned
    IoError(io::Error),

    /// Configuration could not be parsed
    Config(toml::de::Error),
}

impl PoolError {
    /// Whether retrying the same submission later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PoolError::QueueFull | PoolError::Timeout)
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::PoolClosed => write!(f, "pool is closed"),
            PoolError::QueueFull => write!(f, "task queue is full"),
            PoolError::QueueClosed => write!(f, "task queue is closed"),
            PoolError::Timeout => write!(f, "schedule timed out"),
            PoolError::IoError(e) => write!(f, "io error: {}", e),
            PoolError::Config(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::IoError(e) => Some(e),
            PoolError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PoolError {
    fn from(value: io::Error) -> PoolError {
        PoolError::IoError(value)
    }
}

impl From<toml::de::Error> for PoolError {
    fn from(value: toml::de::Error) -> PoolError {
        PoolError::Config(value)
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, PoolError>;
