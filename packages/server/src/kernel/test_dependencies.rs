// TestDependencies - in-memory implementations of the kernel traits
//
// Each double records every call so tests can assert on what would have
// crossed the network, and can be scripted to fail.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use qstash_client::QStashError;
use uuid::Uuid;

use super::{
    BaseContentStore, BaseJobPublisher, BaseUrlSource, PublishReceipt, ServerDeps, StoreOutcome,
    StoreRecord,
};
use crate::common::JobMessage;
use crate::domains::ingestion::SigningKey;

// =============================================================================
// Test URL Source
// =============================================================================

/// FIFO source backed by a `VecDeque`.
#[derive(Default)]
pub struct TestUrlSource {
    queue: RwLock<VecDeque<SourceItem>>,
    polls: RwLock<usize>,
}

enum SourceItem {
    Url(String),
    Error(String),
}

impl TestUrlSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new();
        for url in urls {
            source.push(url);
        }
        source
    }

    pub fn push(&self, url: impl Into<String>) {
        self.queue
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(SourceItem::Url(url.into()));
    }

    /// Queue a failure that the next poll reaching it will return.
    pub fn push_error(&self, message: impl Into<String>) {
        self.queue
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(SourceItem::Error(message.into()));
    }

    /// Number of `next_url` calls so far, including empty polls.
    pub fn poll_count(&self) -> usize {
        *self.polls.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn remaining(&self) -> usize {
        self.queue.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl BaseUrlSource for TestUrlSource {
    async fn next_url(&self) -> Result<Option<String>> {
        *self.polls.write().unwrap_or_else(|e| e.into_inner()) += 1;

        let item = self
            .queue
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match item {
            None => Ok(None),
            Some(SourceItem::Url(url)) => Ok(Some(url)),
            Some(SourceItem::Error(message)) => Err(anyhow::anyhow!(message)),
        }
    }
}

// =============================================================================
// Test Publisher
// =============================================================================

/// A publish call as seen by the broker.
#[derive(Debug, Clone)]
pub struct PublishedJob {
    pub message: JobMessage,
    pub delay: Duration,
    /// The JSON body that would have gone over the wire
    pub body: serde_json::Value,
}

/// Scripted broker response for one publish call.
#[derive(Debug, Clone)]
pub enum PublishBehavior {
    Accept,
    Reject { status: u16 },
    NetworkError,
    /// Never answers; only the caller's timeout or shutdown ends the call
    Hang,
}

/// Records publish calls; answers `Accept` unless scripted otherwise.
#[derive(Default)]
pub struct TestPublisher {
    published: RwLock<Vec<PublishedJob>>,
    attempts: RwLock<usize>,
    script: RwLock<VecDeque<PublishBehavior>>,
}

impl TestPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue behaviors for the next calls, in order.
    pub fn with_script(self, behaviors: impl IntoIterator<Item = PublishBehavior>) -> Self {
        self.script
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .extend(behaviors);
        self
    }

    /// Jobs the broker accepted.
    pub fn published(&self) -> Vec<PublishedJob> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// All publish calls, accepted or not.
    pub fn attempt_count(&self) -> usize {
        *self.attempts.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BaseJobPublisher for TestPublisher {
    async fn publish(&self, message: &JobMessage, delay: Duration) -> Result<PublishReceipt> {
        *self.attempts.write().unwrap_or_else(|e| e.into_inner()) += 1;

        let behavior = self
            .script
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(PublishBehavior::Accept);

        match behavior {
            PublishBehavior::Accept => {
                let body = serde_json::to_value(message)?;
                self.published
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(PublishedJob {
                        message: message.clone(),
                        delay,
                        body,
                    });
                Ok(PublishReceipt {
                    broker_message_id: Some(format!("msg_{}", message.id())),
                })
            }
            PublishBehavior::Reject { status } => Err(QStashError::Api {
                status,
                message: "rejected by test broker".into(),
            }
            .into()),
            PublishBehavior::NetworkError => {
                Err(anyhow::anyhow!("connection refused by test broker"))
            }
            PublishBehavior::Hang => std::future::pending().await,
        }
    }
}

// =============================================================================
// Test Content Store
// =============================================================================

/// Records writes; enforces uniqueness of explicit object ids like the real store.
pub struct TestContentStore {
    records: RwLock<Vec<StoreRecord>>,
    ids: RwLock<HashSet<Uuid>>,
    fail_writes: RwLock<bool>,
    ready: RwLock<bool>,
}

impl Default for TestContentStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            ids: RwLock::new(HashSet::new()),
            fail_writes: RwLock::new(false),
            ready: RwLock::new(true),
        }
    }
}

impl TestContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    pub fn set_ready(&self, ready: bool) {
        *self.ready.write().unwrap_or_else(|e| e.into_inner()) = ready;
    }

    /// Records actually written (duplicates excluded).
    pub fn records(&self) -> Vec<StoreRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl BaseContentStore for TestContentStore {
    async fn store(&self, record: &StoreRecord) -> Result<StoreOutcome> {
        if *self.fail_writes.read().unwrap_or_else(|e| e.into_inner()) {
            anyhow::bail!("test content store unavailable");
        }

        if let Some(id) = record.object_id {
            let mut ids = self.ids.write().unwrap_or_else(|e| e.into_inner());
            if !ids.insert(id) {
                return Ok(StoreOutcome::Duplicate);
            }
        }

        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(StoreOutcome::Stored)
    }

    async fn is_ready(&self) -> Result<bool> {
        Ok(*self.ready.read().unwrap_or_else(|e| e.into_inner()))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of test doubles that can be turned into [`ServerDeps`].
pub struct TestDependencies {
    pub content_store: Arc<TestContentStore>,
    pub signing_key: Option<Arc<SigningKey>>,
    pub deduplicate: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            content_store: Arc::new(TestContentStore::new()),
            signing_key: None,
            deduplicate: true,
        }
    }

    pub fn with_content_store(mut self, store: TestContentStore) -> Self {
        self.content_store = Arc::new(store);
        self
    }

    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(Arc::new(key));
        self
    }

    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.content_store.clone(),
            self.signing_key.clone(),
            self.deduplicate,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
