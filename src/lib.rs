#![deny(missing_docs)]
//! An elastic thread pool that grows with its backlog and shrinks when idle.

pub use config::PoolConfig;
pub use error::{PoolError, Result};
pub use invoke::{DefaultInvokable, Invokable};
pub use panic::{PanicHandler, default_panic_handler, payload_message};
pub use queue::{BoundedTaskQueue, Consumed, Task, TaskQueue};
pub use thread_pool::{ElasticThreadPool, ThreadPool, target_workers};

mod config;
mod error;
mod invoke;
mod panic;
mod queue;
mod thread_pool;
