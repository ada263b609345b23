//! Domain errors for the idea exploration engine.

use thiserror::Error;

/// Domain-level errors shared across ports, adapters, and services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Idea not found: {0}")]
    IdeaNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NodeNotFound("row not found".to_string()),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        Self::Evaluation(err.to_string())
    }
}
