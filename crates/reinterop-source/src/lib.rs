//! Managed-side inputs for the Reinterop binding generator
//!
//! This crate reads what the generator knows about the managed world:
//! - assembly metadata documents describing type definitions
//! - the bodies of `ExposeToCPP` methods, lexed and parsed into a syntax tree

pub mod metadata;
pub mod syntax;

// Re-export commonly used items for convenience
pub use metadata::{load_assembly, load_model, parse_assembly, MetadataDiscovery, METADATA_SUFFIX};
pub use syntax::{parse_body, parse_type_syntax, SyntaxError};
