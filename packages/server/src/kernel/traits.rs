// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Dispatch and ingestion rules live in domains/*, which talk to the outside
// world exclusively through these traits.
//
// Naming convention: Base* for trait names (e.g., BaseUrlSource, BaseContentStore)

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::common::JobMessage;

// =============================================================================
// URL Source Trait (Infrastructure - FIFO of candidate URLs)
// =============================================================================

#[async_trait]
pub trait BaseUrlSource: Send + Sync {
    /// Pop the oldest URL. `Ok(None)` means the source is empty right now.
    async fn next_url(&self) -> Result<Option<String>>;
}

// =============================================================================
// Job Publisher Trait (Infrastructure - push-delivery broker)
// =============================================================================

/// Broker acknowledgement of an accepted publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Broker-side message id, when the broker returns one
    pub broker_message_id: Option<String>,
}

#[async_trait]
pub trait BaseJobPublisher: Send + Sync {
    /// Hand one job to the broker, asking it to hold the job for `delay`.
    ///
    /// Implementations must not retry. Broker failures should keep their
    /// typed source (e.g. `qstash_client::QStashError`) inside the returned
    /// `anyhow::Error` so callers can classify them.
    async fn publish(&self, message: &JobMessage, delay: Duration) -> Result<PublishReceipt>;
}

// =============================================================================
// Content Store Trait (Infrastructure - vector/document index)
// =============================================================================

/// A record to write into the content store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    /// Store-side class (collection) label
    pub class: String,
    pub properties: serde_json::Value,
    /// Deterministic object id. `None` lets the store assign one, so every
    /// write creates a new object.
    pub object_id: Option<Uuid>,
}

/// What the store did with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// An object with the same `object_id` already exists; nothing was written
    Duplicate,
}

#[async_trait]
pub trait BaseContentStore: Send + Sync {
    /// Write a single record.
    async fn store(&self, record: &StoreRecord) -> Result<StoreOutcome>;

    /// Readiness probe. `Ok(false)` means reachable but not ready.
    async fn is_ready(&self) -> Result<bool>;
}
