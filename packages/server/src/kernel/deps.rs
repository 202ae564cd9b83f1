//! Server dependencies (using traits for testability)
//!
//! Client handles are built once at process start and passed explicitly into
//! the dispatcher and the HTTP handlers. The adapters below wrap the pure REST
//! clients so the domains only ever see the `Base*` traits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use qstash_client::{PublishOptions, QStashClient};
use serde_json::Value;
use weaviate_client::{NewObject, WeaviateClient, WeaviateError};

use crate::common::JobMessage;
use crate::domains::ingestion::SigningKey;
use crate::kernel::{
    BaseContentStore, BaseJobPublisher, PublishReceipt, StoreOutcome, StoreRecord,
};

// =============================================================================
// QStashClient Adapter (implements BaseJobPublisher trait)
// =============================================================================

/// Wrapper around QStashClient that implements BaseJobPublisher trait
pub struct QStashAdapter(pub Arc<QStashClient>);

impl QStashAdapter {
    pub fn new(client: Arc<QStashClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseJobPublisher for QStashAdapter {
    async fn publish(&self, message: &JobMessage, delay: Duration) -> Result<PublishReceipt> {
        let resp = self
            .0
            .publish_json(message, &PublishOptions::with_delay(delay))
            .await?;

        Ok(PublishReceipt {
            broker_message_id: resp.message_id,
        })
    }
}

// =============================================================================
// WeaviateClient Adapter (implements BaseContentStore trait)
// =============================================================================

/// Wrapper around WeaviateClient that implements BaseContentStore trait
pub struct WeaviateAdapter(pub Arc<WeaviateClient>);

impl WeaviateAdapter {
    pub fn new(client: Arc<WeaviateClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseContentStore for WeaviateAdapter {
    async fn store(&self, record: &StoreRecord) -> Result<StoreOutcome> {
        let properties = stored_properties(&record.properties);
        let mut object = NewObject::new(record.class.clone(), properties);
        if let Some(id) = record.object_id {
            object = object.with_id(id);
        }

        match self.0.create_object(&object).await {
            Ok(_) => Ok(StoreOutcome::Stored),
            Err(WeaviateError::AlreadyExists { .. }) => Ok(StoreOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_ready(&self) -> Result<bool> {
        Ok(self.0.is_ready().await?)
    }
}

/// Properties as written to Weaviate.
///
/// `id` is reserved there, so a top-level `id` is filed as `jobId`.
pub fn stored_properties(properties: &Value) -> Value {
    let mut properties = properties.clone();
    if let Some(map) = properties.as_object_mut() {
        if let Some(job_id) = map.remove("id") {
            map.insert("jobId".to_string(), job_id);
        }
    }
    properties
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies of the webhook-facing HTTP service.
///
/// Shared read-only by every in-flight request. The content store is the
/// only shared mutable resource and its client handles its own concurrency.
#[derive(Clone)]
pub struct ServerDeps {
    pub content_store: Arc<dyn BaseContentStore>,
    /// Broker signing key. `None` is tolerated at startup; every webhook call
    /// then fails with a configuration error.
    pub signing_key: Option<Arc<SigningKey>>,
    /// Derive store object ids from job ids so redeliveries collapse
    pub deduplicate: bool,
}

impl ServerDeps {
    pub fn new(
        content_store: Arc<dyn BaseContentStore>,
        signing_key: Option<Arc<SigningKey>>,
        deduplicate: bool,
    ) -> Self {
        Self {
            content_store,
            signing_key,
            deduplicate,
        }
    }
}
