use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::Arc;

use log::error;

/// Receives the payload of a panic caught on a pool thread.
pub type PanicHandler = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync + 'static>;

/// The handler a pool starts with: logs the panic message and a backtrace.
pub fn default_panic_handler() -> PanicHandler {
    Arc::new(|payload| {
        error!("panic from worker: {}", payload_message(payload.as_ref()));
        error!("panic from worker: {}", Backtrace::force_capture());
    })
}

/// Best effort rendering of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Box<dyn Any>"
    }
}
