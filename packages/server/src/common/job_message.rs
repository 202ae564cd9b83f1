//! The unit of work handed from the crawler to the push-delivery broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Id;

/// Marker for job ids.
pub struct Job;

/// 128-bit random job identifier, assigned before any network call.
pub type JobId = Id<Job>;

/// Immutable job message.
///
/// Wire form: `{"id": "<uuid>", "url": "<string>", "ts": "<RFC 3339, UTC>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    id: JobId,
    url: String,
    ts: DateTime<Utc>,
}

impl JobMessage {
    /// Stamp a URL with a fresh id and the current time.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            ts: Utc::now(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.ts
    }
}
