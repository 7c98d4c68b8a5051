//! Runtime side of the Reinterop boundary protocol
//!
//! The generated code carries its own copies of these pieces in the managed
//! and native languages; this crate is the same protocol for a Rust host and
//! the reference the generated code is tested against:
//! - object handles with a reserved null handle
//! - the deferred destruction queue
//! - the startup function-pointer table and its count check
//! - the initialization and reload state machine
//! - capture of failures at the boundary

pub mod destroy_queue;
pub mod error;
pub mod exception;
pub mod handle;
pub mod init;
pub mod table;

pub use destroy_queue::{DestroyQueue, PendingRelease};
pub use error::{InitError, InitResult};
pub use exception::{call_capturing, catch_boundary, rethrow, BoundaryException};
pub use handle::{HandleTable, ObjectHandle};
pub use init::{InitState, Runtime};
pub use table::{FunctionTable, TableLayout};
