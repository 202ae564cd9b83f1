use std::time::Duration;

use serde::Deserialize;

/// Per-message publish options.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// How long the broker holds the message before pushing it to the destination.
    pub delay: Option<Duration>,
}

impl PublishOptions {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

/// Body returned by the publish endpoint on success.
///
/// Only `messageId` is read; brokers that answer with an empty or
/// non-JSON body still count as a successful publish.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishResponse {
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
}
