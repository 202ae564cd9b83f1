//! Error types for the QStash client.

use thiserror::Error;

/// Result type for QStash client operations.
pub type Result<T> = std::result::Result<T, QStashError>;

/// QStash client errors.
#[derive(Debug, Error)]
pub enum QStashError {
    /// Configuration error (empty endpoint or token, unbuildable HTTP client)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Network error (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx response from the broker
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for QStashError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QStashError::Timeout
        } else {
            QStashError::Network(err)
        }
    }
}
