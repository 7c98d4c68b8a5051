//! Error handling for Reinterop binding generation
//!
//! This module provides the error type shared by every stage of the generator
//! together with the diagnostic records that are surfaced through the host
//! tooling's diagnostic channel.

use thiserror::Error;
use std::path::PathBuf;

/// Main error type for Reinterop operations
#[derive(Error, Debug)]
pub enum ReinteropError {
    /// An `ExposeToCPP` body could not be parsed
    #[error("Syntax error in {context} at {line}:{column}: {message}")]
    Syntax {
        message: String,
        context: String,
        line: u32,
        column: u32,
    },

    /// A type reference string in the metadata is malformed
    #[error("Invalid type reference '{text}': {reason}")]
    InvalidTypeReference {
        text: String,
        reason: String,
    },

    /// Managed metadata is structurally inconsistent
    #[error("Metadata error: {message}")]
    Metadata {
        message: String,
        type_name: Option<String>,
    },

    /// A type cannot be marshaled across the boundary
    #[error("Unsupported interop type '{type_name}' used by {member}")]
    UnsupportedType {
        type_name: String,
        member: String,
    },

    /// Code generation errors
    #[error("Generation error: {message}")]
    Generation {
        message: String,
        type_name: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl ReinteropError {
    /// Create a syntax error with location information
    pub fn syntax<S: Into<String>, C: Into<String>>(message: S, context: C, line: u32, column: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            context: context.into(),
            line,
            column,
        }
    }

    /// Create an invalid type reference error
    pub fn invalid_type_reference<T: Into<String>, R: Into<String>>(text: T, reason: R) -> Self {
        Self::InvalidTypeReference {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Create a new metadata error
    pub fn metadata<S: Into<String>>(message: S) -> Self {
        Self::Metadata {
            message: message.into(),
            type_name: None,
        }
    }

    /// Create a metadata error attached to a type
    pub fn metadata_for_type<S: Into<String>, T: Into<String>>(message: S, type_name: T) -> Self {
        Self::Metadata {
            message: message.into(),
            type_name: Some(type_name.into()),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type<T: Into<String>, M: Into<String>>(type_name: T, member: M) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
            type_name: None,
        }
    }

    /// Create a generation error attached to a type
    pub fn generation_for_type<S: Into<String>, T: Into<String>>(message: S, type_name: T) -> Self {
        Self::Generation {
            message: message.into(),
            type_name: Some(type_name.into()),
        }
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_with_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// Result type for Reinterop operations
pub type ReinteropResult<T> = Result<T, ReinteropError>;

/// Diagnostic information reported during generation
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub code: Option<String>,
    pub help: Option<String>,
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
    Hint,
}

impl Diagnostic {
    fn with_level<S: Into<String>>(level: DiagnosticLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            code: None,
            help: None,
        }
    }

    /// Create a new error diagnostic
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    /// Create a new warning diagnostic
    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    /// Create a new info diagnostic
    pub fn info<S: Into<String>>(message: S) -> Self {
        Self::with_level(DiagnosticLevel::Info, message)
    }

    /// Add location information to the diagnostic
    pub fn with_location(mut self, file: PathBuf, line: u32, column: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Add a diagnostic code such as `RI0001`
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add help text to the diagnostic
    pub fn with_help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Diagnostic collector for gathering generation issues
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new diagnostic collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the collector
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error diagnostic
    pub fn error<S: Into<String>>(&mut self, message: S) {
        self.add(Diagnostic::error(message));
    }

    /// Add a warning diagnostic
    pub fn warning<S: Into<String>>(&mut self, message: S) {
        self.add(Diagnostic::warning(message));
    }

    /// Add an info diagnostic
    pub fn info<S: Into<String>>(&mut self, message: S) {
        self.add(Diagnostic::info(message));
    }

    /// Append every diagnostic of another collector
    pub fn extend(&mut self, other: DiagnosticCollector) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Warning)
    }

    /// Get the number of errors
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Error).count()
    }

    /// Get the number of warnings
    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.level == DiagnosticLevel::Warning).count()
    }

    /// Clear all diagnostics
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Convert to a result, returning an error if there are any error diagnostics
    pub fn into_result(self) -> ReinteropResult<Vec<Diagnostic>> {
        if self.has_errors() {
            let error_messages: Vec<String> = self.diagnostics
                .iter()
                .filter(|d| d.level == DiagnosticLevel::Error)
                .map(|d| d.message.clone())
                .collect();

            Err(ReinteropError::generation(format!(
                "Generation failed with {} error(s): {}",
                error_messages.len(),
                error_messages.join("; ")
            )))
        } else {
            Ok(self.diagnostics)
        }
    }
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Hint => write!(f, "hint"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;

        if let (Some(file), Some(line), Some(column)) = (&self.file, self.line, self.column) {
            write!(f, " at {}:{}:{}", file.display(), line, column)?;
        }

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  help: {}", help)?;
        }

        Ok(())
    }
}
