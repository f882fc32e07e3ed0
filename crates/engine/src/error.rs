//! Error types for the engine crate

use thiserror::Error;
use witness_core::{AccountId, StoreError};
use witness_crypto::KeyError;

/// Faults that stop a role engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Rejections and faults on the query path.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Door account {door} matches neither side of the bridge")]
    InvalidDirection { door: AccountId },

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl QueryError {
    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Startup and lifecycle faults of a witness node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Engines are already running")]
    AlreadyRunning,

    #[error("Stateless nodes do not run role engines")]
    Stateless,
}
