//! Error types for Perseus core

use thiserror::Error;

use crate::sql::FunctionKind;

#[derive(Error, Debug)]
pub enum PerseusError {
    #[error("Step index {index} out of range for chain of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Unknown transformation function: {0}")]
    UnknownFunction(String),

    #[error("Function edit changed kind from {expected} to {found}")]
    KindMismatch {
        expected: FunctionKind,
        found: FunctionKind,
    },

    #[error("Unknown table area: {0}")]
    UnknownArea(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PerseusError>;

impl From<anyhow::Error> for PerseusError {
    fn from(err: anyhow::Error) -> Self {
        PerseusError::Internal(err.to_string())
    }
}
