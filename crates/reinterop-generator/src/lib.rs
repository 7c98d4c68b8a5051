//! Reinterop binding generator
//!
//! Generates the native and managed halves of a managed/native interop layer
//! from the types an application actually uses:
//! - the walker reads `ExposeToCPP` bodies and records every member they touch
//! - the chainer links generated types to generated ancestors
//! - the orchestrator runs the emitters for each type
//! - distribution renders headers, sources and the consolidated managed file,
//!   including the startup function-pointer table

pub mod chainer;
pub mod classifier;
pub mod config;
pub mod context;
pub mod distribution;
pub mod emitters;
pub mod graph;
pub mod init_protocol;
pub mod marshal;
pub mod naming;
pub mod orchestrator;
pub mod pipeline;
pub mod result;
pub mod walker;

#[cfg(test)]
mod test_support;

// Re-export commonly used items for convenience
pub use classifier::{InteropTypeKind, TypeClassifier};
pub use config::{ConfigError, ReinteropConfig};
pub use context::GenerationContext;
pub use distribution::{GeneratedFiles, OutputFile, OutputKind};
pub use emitters::custom::{CustomGenerator, CustomGeneratorRegistry};
pub use graph::{TypeGraph, TypeToGenerate};
pub use orchestrator::CodeGenerator;
pub use pipeline::{GenerationPipeline, GenerationReport};
pub use result::{GeneratedResult, GeneratedType, InteropFunction, InteropRegistry};
pub use walker::TypeGraphWalker;
