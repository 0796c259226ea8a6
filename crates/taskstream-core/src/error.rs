//! Centralized error types for taskstream.

use thiserror::Error;

/// Main error type for taskstream operations.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(#[from] taskstream_db::DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for taskstream operations.
pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
