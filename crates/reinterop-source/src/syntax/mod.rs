//! Lexing and parsing of `ExposeToCPP` entry bodies

pub mod ast;
pub mod lexer;
mod parser;

pub use parser::{parse_body, parse_type_syntax};

use reinterop_core::ReinteropError;

/// A malformed entry body, with the location of the offending token
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    /// Convert into the generator error, naming the entry the body came from
    pub fn into_reinterop_error(self, context: impl Into<String>) -> ReinteropError {
        ReinteropError::syntax(self.message, context, self.line, self.column)
    }
}
