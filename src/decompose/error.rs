//! Error taxonomy surfaced by the decomposition service.

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Duplicate registration
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad limit or malformed input
    #[error("{0}")]
    InvalidArgument(String),

    /// The LLM provider call itself failed
    #[error("LLM provider call failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ServiceError::Conflict(err.to_string()),
            StoreError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            StoreError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            other => ServiceError::Storage(other),
        }
    }
}
