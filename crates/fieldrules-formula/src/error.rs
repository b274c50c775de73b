//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Field missing from the evaluation context
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// Function missing from the evaluation context
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Operand of the wrong type for an operator
    #[error("Type error: {0}")]
    Type(String),

    /// Invalid function argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Integer arithmetic overflowed
    #[error("Integer overflow in '{0}'")]
    Overflow(&'static str),

    /// A function returned an error or panicked
    #[error("Function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },
}

impl FormulaError {
    /// Create a syntax error
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        FormulaError::Syntax(msg.into())
    }

    /// Create an argument error
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        FormulaError::Argument(msg.into())
    }
}
