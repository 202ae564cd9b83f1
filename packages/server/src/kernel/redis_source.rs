//! Redis list as the crawler's URL source.
//!
//! URLs are appended with `RPUSH` and consumed with `LPOP`, giving FIFO order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::BaseUrlSource;

/// Default list key shared by the crawler and the seeding CLI.
pub const DEFAULT_LIST_KEY: &str = "start_urls";

/// Redis-backed FIFO of candidate URLs.
///
/// The connection is released when the source is dropped.
pub struct RedisUrlSource {
    conn: ConnectionManager,
    key: String,
}

impl RedisUrlSource {
    pub async fn connect(redis_url: &str, key: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            conn,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append URLs to the tail of the list. Returns the new list length.
    pub async fn push_urls(&self, urls: &[String]) -> Result<usize> {
        if urls.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let len: usize = conn
            .rpush(&self.key, urls)
            .await
            .context("RPUSH failed")?;
        Ok(len)
    }
}

#[async_trait]
impl BaseUrlSource for RedisUrlSource {
    async fn next_url(&self) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.lpop(&self.key, None).await.context("LPOP failed")?;

        raw.map(decode_url).transpose()
    }
}

/// List entries arrive as raw bytes and must be valid UTF-8.
fn decode_url(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).context("URL popped from source is not valid UTF-8")
}
