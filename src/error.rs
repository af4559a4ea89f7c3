//! Error types for the rule engine

use thiserror::Error;

/// Main error type for compiling, combining and evaluating rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Malformed rule: {0}")]
    MalformedRule(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Field {field} not found in data")]
    FieldNotFound { field: String },

    #[error("Cannot compare numeric field '{field}' with non-numeric value '{literal}'")]
    TypeMismatch { field: String, literal: String },

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid AST document: {0}")]
    InvalidDocument(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Rule not found: {0}")]
    RuleNotFound(u64),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::Deserialization(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyTypeError, PyValueError};

        match err {
            RuleError::FieldNotFound { .. } | RuleError::RuleNotFound(_) => {
                PyKeyError::new_err(err.to_string())
            }
            RuleError::TypeMismatch { .. } => PyTypeError::new_err(err.to_string()),
            RuleError::MalformedRule(_)
            | RuleError::UnsupportedOperator(_)
            | RuleError::InvalidNode(_)
            | RuleError::InvalidDocument(_)
            | RuleError::Deserialization(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleError>;
