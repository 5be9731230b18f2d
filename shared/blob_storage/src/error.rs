//! Error types for blob store operations

use thiserror::Error;

/// Result type for blob store operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob store operations
#[derive(Error, Debug)]
pub enum BlobError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No object exists under the requested key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Storage service error
    #[error("Storage service error: {0}")]
    Service(String),

    /// Upstream service error (5xx from the provider)
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
