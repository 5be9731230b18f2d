//! Error types for network gateway operations

use thiserror::Error;

/// Result type for network gateway operations
pub type NetResult<T> = Result<T, NetError>;

/// Errors that can occur during network gateway operations
#[derive(Error, Debug)]
pub enum NetError {
    /// Invalid input provided
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The provider accepted the request but omitted a field the caller
    /// needs
    #[error("Response missing required field: {0}")]
    MissingResponseField(&'static str),

    /// Network service error
    #[error("Network service error: {0}")]
    Service(String),

    /// Upstream service error (5xx from the provider)
    #[error("Upstream service error: {0}")]
    Upstream(String),
}
