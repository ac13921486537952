//! Panic containment for synchronous calls into extension code.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use tracing::warn;

/// Runs `call` and returns `None` if it panicked. The panic is logged
/// against `plugin_id` and never reaches the caller.
pub(crate) fn contain_panic<T>(plugin_id: &str, what: &str, call: impl FnOnce() -> T) -> Option<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => Some(value),
        Err(panic) => {
            warn!(
                plugin_id = %plugin_id,
                call = %what,
                error = %panic_message(panic.as_ref()),
                "Extension panicked"
            );
            None
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
