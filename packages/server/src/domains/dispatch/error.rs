//! Dispatch error taxonomy and the policy attached to each kind.

use std::time::Duration;

use qstash_client::QStashError;
use thiserror::Error;

/// Errors the dispatcher can run into.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Broker endpoint or credential missing or unusable
    #[error("dispatcher misconfigured: {0}")]
    Config(String),

    /// Source unreachable, or the popped item could not be decoded
    #[error("URL source error: {0}")]
    Source(#[source] anyhow::Error),

    /// Broker answered with a non-2xx status
    #[error("broker rejected publish with status {status}")]
    PublishRejected { status: u16 },

    /// Broker unreachable or the connection failed mid-request
    #[error("publish transport failure: {0}")]
    PublishTransport(#[source] anyhow::Error),

    /// No answer from the broker within the publish timeout
    #[error("publish timed out after {0:?}")]
    PublishTimeout(Duration),
}

/// What the dispatch loop does about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Refuse to start the loop
    Fatal,
    /// Log, drop the current job if any, keep polling
    LogAndContinue,
}

impl DispatchError {
    pub fn policy(&self) -> DispatchPolicy {
        match self {
            DispatchError::Config(_) => DispatchPolicy::Fatal,
            DispatchError::Source(_)
            | DispatchError::PublishRejected { .. }
            | DispatchError::PublishTransport(_)
            | DispatchError::PublishTimeout(_) => DispatchPolicy::LogAndContinue,
        }
    }

    /// Classify a publisher failure, keeping the broker's status when there is one.
    pub fn from_publish(err: anyhow::Error, timeout: Duration) -> Self {
        match err.downcast_ref::<QStashError>() {
            Some(QStashError::Api { status, .. }) => DispatchError::PublishRejected { status: *status },
            Some(QStashError::Timeout) => DispatchError::PublishTimeout(timeout),
            Some(QStashError::Config(msg)) => DispatchError::Config(msg.clone()),
            _ => DispatchError::PublishTransport(err),
        }
    }
}
