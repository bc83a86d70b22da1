//! Crate-wide domain error type.
//!
//! Each port defines a narrow error enum of its own; handlers fold those
//! into `DomainError` before deciding how to react (record, retry, recycle).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("task not found: {0}")]
    TaskNotFound(i64),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("git command failed: {0}")]
    Git(String),

    #[error("code host command failed: {0}")]
    CodeHost(String),

    #[error("agent substrate failed: {0}")]
    Substrate(String),

    #[error("agent invocation timed out after {0}s")]
    AgentTimeout(u64),

    #[error("io error: {0}")]
    Io(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
