//! Core error types

use thiserror::Error;

/// Errors raised while constructing or parsing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A field failed validation
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Malformed bridge descriptor
    #[error("Invalid bridge descriptor: {0}")]
    InvalidBridge(String),

    /// Malformed amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl CoreError {
    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
