//! Pure Weaviate REST API client.
//!
//! Covers the two calls the ingestion path needs: writing a single object
//! into a class and probing server readiness.
//!
//! # Example
//!
//! ```rust,ignore
//! use weaviate_client::{NewObject, WeaviateClient};
//!
//! let client = WeaviateClient::new("http://weaviate:8080")?;
//! if client.is_ready().await? {
//!     client
//!         .create_object(&NewObject::new("RawURL", serde_json::json!({"url": "https://example.com"})))
//!         .await?;
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{Result, WeaviateError};
pub use types::{NewObject, StoredObject};

use std::time::Duration;

use reqwest::StatusCode;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WeaviateClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeaviateClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(WeaviateError::Config(format!(
                "base URL must be http(s): {:?}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| WeaviateError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// `GET /v1/.well-known/ready`. A non-2xx answer means "not ready", not an error.
    pub async fn is_ready(&self) -> Result<bool> {
        let url = format!("{}/v1/.well-known/ready", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// `POST /v1/objects`.
    ///
    /// When the object carries an explicit id that is already taken the
    /// server answers 422; that case is surfaced as
    /// [`WeaviateError::AlreadyExists`] so callers can treat it as a duplicate.
    ///
    /// Any 2xx status means the write happened. The echoed object is returned
    /// when the response body decodes, `None` otherwise.
    pub async fn create_object(&self, object: &NewObject) -> Result<Option<StoredObject>> {
        let url = format!("{}/v1/objects", self.base_url);
        let resp = self.client.post(&url).json(object).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            if let Some(id) = object.id {
                if status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("already exists")
                {
                    return Err(WeaviateError::AlreadyExists { id });
                }
            }
            return Err(WeaviateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<StoredObject>(&body) {
            Ok(stored) => {
                tracing::debug!(
                    id = %stored.id,
                    class = %stored.class,
                    "Object stored in Weaviate"
                );
                Ok(Some(stored))
            }
            Err(e) => {
                tracing::warn!(
                    status = status.as_u16(),
                    error = %e,
                    "Object stored in Weaviate but response body was not understood"
                );
                Ok(None)
            }
        }
    }
}
