//! Pure QStash REST API client.
//!
//! A minimal client for the publish side of the Upstash QStash push-delivery
//! broker. The broker accepts a JSON message, holds it for the requested
//! delay, then delivers it as a signed HTTP callback to the destination
//! encoded in the publish URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use qstash_client::{PublishOptions, QStashClient};
//! use std::time::Duration;
//!
//! let client = QStashClient::new(
//!     "https://qstash.upstash.io/v2/publish/https://example.com/api/qstash".into(),
//!     "your-token".into(),
//! )?;
//!
//! let resp = client
//!     .publish_json(&serde_json::json!({"url": "https://example.com"}), &PublishOptions::with_delay(Duration::from_secs(60)))
//!     .await?;
//! println!("{:?}", resp.message_id);
//! ```

pub mod error;
pub mod types;

pub use error::{QStashError, Result};
pub use types::{PublishOptions, PublishResponse};

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

/// Header carrying the delivery delay, in seconds.
pub const DELAY_HEADER: &str = "Upstash-Delay";

/// Header carrying the signed JWT on every delivery the broker makes.
pub const SIGNATURE_HEADER: &str = "Upstash-Signature";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct QStashClient {
    client: reqwest::Client,
    publish_url: String,
    token: String,
}

impl QStashClient {
    /// Build a client with the default request timeout.
    pub fn new(publish_url: String, token: String) -> Result<Self> {
        Self::with_timeout(publish_url, token, DEFAULT_TIMEOUT)
    }

    /// Build a client whose requests fail with [`QStashError::Timeout`] after `timeout`.
    pub fn with_timeout(publish_url: String, token: String, timeout: Duration) -> Result<Self> {
        if publish_url.trim().is_empty() {
            return Err(QStashError::Config("publish URL is empty".into()));
        }
        if token.trim().is_empty() {
            return Err(QStashError::Config("token is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QStashError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            publish_url,
            token,
        })
    }

    pub fn publish_url(&self) -> &str {
        &self.publish_url
    }

    /// Publish a JSON message. Any non-2xx status is an error.
    pub async fn publish_json<T: Serialize + ?Sized>(
        &self,
        body: &T,
        options: &PublishOptions,
    ) -> Result<PublishResponse> {
        let mut request = self
            .client
            .post(&self.publish_url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json");

        if let Some(delay) = options.delay {
            request = request.header(DELAY_HEADER, delay.as_secs().to_string());
        }

        let resp = request.json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(QStashError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let parsed = serde_json::from_str::<PublishResponse>(&text).unwrap_or_default();
        tracing::debug!(message_id = ?parsed.message_id, "Message accepted by QStash");

        Ok(parsed)
    }
}
