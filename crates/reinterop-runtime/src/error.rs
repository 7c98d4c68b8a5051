//! Runtime protocol errors

use crate::init::InitState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The two halves were generated from different inputs
    #[error("Expected {expected} function pointers but received {received}; the managed and native code were generated separately")]
    CountMismatch { expected: usize, received: i64 },

    #[error("Function pointer table is null but {count} entries were announced")]
    NullTable { count: usize },

    #[error("Function pointer for {name} (slot {slot}) is null")]
    NullEntry { slot: usize, name: String },

    #[error("Cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: InitState, to: InitState },

    #[error("Boundary functions are unavailable while {0:?}")]
    NotReady(InitState),

    #[error("No function named {0} in the table layout")]
    UnknownFunction(String),
}

pub type InitResult<T> = Result<T, InitError>;
