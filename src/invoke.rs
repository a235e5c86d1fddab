use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::Result;
use crate::thread_pool::ThreadPool;

/// Something that runs a value through a fixed function on a pool.
pub trait Invokable<T> {
    /// Schedules the call and forgets about it. Scheduling errors are dropped.
    fn invoke(&self, value: T);

    /// Schedules the call, waiting at most `timeout` for room in the queue.
    ///
    /// # Errors
    ///
    /// Returns whatever `ThreadPool::schedule_with_timeout` returns.
    fn invoke_with_timeout(&self, value: T, timeout: Duration) -> Result<()>;
}

/// Binds a callee to a pool.
pub struct DefaultInvokable<T, P> {
    pool: Arc<P>,
    callee: Arc<dyn Fn(T) + Send + Sync + 'static>,
}

impl<T, P> DefaultInvokable<T, P>
where
    T: Send + 'static,
    P: ThreadPool,
{
    /// Creates an invokable running `callee` on `pool`.
    pub fn new<F>(pool: Arc<P>, callee: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        DefaultInvokable {
            pool,
            callee: Arc::new(callee),
        }
    }

    /// Rebinds the pool.
    pub fn set_pool(&mut self, pool: Arc<P>) -> &mut Self {
        self.pool = pool;
        self
    }

    /// Rebinds the callee. Calls already scheduled keep the old one.
    pub fn set_callee<F>(&mut self, callee: F) -> &mut Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.callee = Arc::new(callee);
        self
    }
}

fn bind<T>(
    callee: Arc<dyn Fn(T) + Send + Sync + 'static>,
    value: T,
) -> impl FnOnce() + Send + 'static
where
    T: Send + 'static,
{
    move || callee(value)
}

impl<T, P> Invokable<T> for DefaultInvokable<T, P>
where
    T: Send + 'static,
    P: ThreadPool,
{
    fn invoke(&self, value: T) {
        if let Err(e) = self.pool.schedule(bind(Arc::clone(&self.callee), value)) {
            debug!("dropped invocation: {}", e);
        }
    }

    fn invoke_with_timeout(&self, value: T, timeout: Duration) -> Result<()> {
        self.pool.schedule_with_timeout(bind(Arc::clone(&self.callee), value), timeout)
    }
}
