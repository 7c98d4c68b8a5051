//! Core types for the Reinterop binding generator
//!
//! This crate holds what every other part of the generator shares:
//! - the managed type model (`TypeRef`, `TypeDefinition`, `TypeModel`)
//! - the error type and diagnostic records
//! - the diagnostic reporter that mirrors diagnostics into `log`

pub mod error;
pub mod diagnostics;
pub mod types;
pub mod model;

pub use error::*;
pub use diagnostics::DiagnosticReporter;
pub use types::{well_known, keyword_alias, TypeRef};
pub use model::{
    Accessibility, AssemblyMetadata, AttributeData, EnumValue, EventSymbol, FieldSymbol, MethodSymbol,
    ParameterSymbol, PropertySymbol, TypeDefinition, TypeDefinitionKind, TypeModel,
    EXPOSE_METHOD_NAME, NATIVE_IMPLEMENTATION_ATTRIBUTE,
};
