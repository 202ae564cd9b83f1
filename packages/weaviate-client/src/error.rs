//! Error types for the Weaviate client.

use thiserror::Error;
use uuid::Uuid;

/// Result type for Weaviate client operations.
pub type Result<T> = std::result::Result<T, WeaviateError>;

/// Weaviate client errors.
#[derive(Debug, Error)]
pub enum WeaviateError {
    /// Invalid base URL or unbuildable HTTP client
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An object with the requested id is already stored
    #[error("object {id} already exists")]
    AlreadyExists { id: Uuid },

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}
