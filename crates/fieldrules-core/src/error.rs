//! Error types for fieldrules-core

use crate::overrides::OverrideState;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldrules-core
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Override lifecycle transition not allowed from the current state
    #[error("Cannot {action} override in state {from}")]
    InvalidTransition {
        action: &'static str,
        from: OverrideState,
    },

    /// Unrecognised field type name
    #[error("Invalid field type: {0}")]
    InvalidFieldType(String),

    /// Field id that is empty or otherwise malformed
    #[error("Invalid field id: {0:?}")]
    InvalidFieldId(String),

    /// Invalid value type for operation
    #[error("Invalid value type: expected {expected}, got {actual}")]
    InvalidValueType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
