//! Boundary exception capture
//!
//! Unwinding must never cross the boundary. A function called from the other
//! side runs under [`call_capturing`]: a panic is caught, stored in the
//! caller-provided slot and a default value is returned instead. The caller
//! checks the slot with [`rethrow`] right after the call.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// A failure captured on one side of the boundary, to be raised on the other
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BoundaryException {
    pub message: String,
}

impl BoundaryException {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else if let Some(exception) = payload.downcast_ref::<BoundaryException>() {
            exception.message.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }
}

/// Run `f`, turning a panic into an error
pub fn catch_boundary<R, F>(f: F) -> Result<R, BoundaryException>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(BoundaryException::from_panic)
}

/// Run `f` for a caller across the boundary; on panic, store it in `slot` and return `R::default()`
pub fn call_capturing<R, F>(slot: &mut Option<BoundaryException>, f: F) -> R
where
    R: Default,
    F: FnOnce() -> R,
{
    match catch_boundary(f) {
        Ok(value) => value,
        Err(exception) => {
            log::debug!("Captured boundary exception: {}", exception);
            *slot = Some(exception);
            R::default()
        }
    }
}

/// Raise whatever the last call stored in `slot`
pub fn rethrow(slot: &mut Option<BoundaryException>) -> Result<(), BoundaryException> {
    match slot.take() {
        Some(exception) => Err(exception),
        None => Ok(()),
    }
}
