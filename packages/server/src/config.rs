use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::kernel::DEFAULT_LIST_KEY;

const DEFAULT_REDIS_URL: &str = "redis://redis:6379";
const DEFAULT_WEAVIATE_URL: &str = "http://weaviate:8080";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_QSTASH_TIMEOUT_SECS: u64 = 10;

/// Crawler (dispatcher) configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub qstash_url: String,
    pub qstash_token: String,
    pub qstash_timeout: Duration,
    pub redis_url: String,
    pub source_list_key: String,
}

impl CrawlerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let qstash_timeout_secs = match non_empty(&lookup, "QSTASH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .context("QSTASH_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_QSTASH_TIMEOUT_SECS,
        };

        Ok(Self {
            qstash_url: non_empty(&lookup, "QSTASH_URL").context("QSTASH_URL must be set")?,
            qstash_token: non_empty(&lookup, "QSTASH_TOKEN")
                .context("QSTASH_TOKEN must be set")?,
            qstash_timeout: Duration::from_secs(qstash_timeout_secs),
            redis_url: redis_url(&lookup),
            source_list_key: source_list_key(&lookup),
        })
    }
}

/// Orchestrator (webhook + health) configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub port: u16,
    pub weaviate_url: String,
    /// Raw signing key; absent means every webhook is rejected with 500
    pub qstash_signing_key: Option<String>,
    pub deduplicate: bool,
}

impl OrchestratorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => raw.parse().context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };

        let deduplicate = match non_empty(&lookup, "INGEST_DEDUPLICATE") {
            Some(raw) => parse_bool(&raw).context("INGEST_DEDUPLICATE must be true or false")?,
            None => true,
        };

        Ok(Self {
            port,
            weaviate_url: non_empty(&lookup, "WEAVIATE_URL")
                .unwrap_or_else(|| DEFAULT_WEAVIATE_URL.to_string()),
            qstash_signing_key: non_empty(&lookup, "QSTASH_SIGNING_KEY"),
            deduplicate,
        })
    }
}

/// Redis settings shared by the crawler and the seeding CLI
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub redis_url: String,
    pub source_list_key: String,
}

impl SourceConfig {
    pub fn from_env() -> Self {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            redis_url: redis_url(&lookup),
            source_list_key: source_list_key(&lookup),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redis_url(lookup: &impl Fn(&str) -> Option<String>) -> String {
    non_empty(lookup, "REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string())
}

fn source_list_key(lookup: &impl Fn(&str) -> Option<String>) -> String {
    non_empty(lookup, "SOURCE_LIST_KEY").unwrap_or_else(|| DEFAULT_LIST_KEY.to_string())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized boolean {:?}", other),
    }
}
