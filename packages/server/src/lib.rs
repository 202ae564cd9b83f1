// Crawl-to-index pipeline - core library
//
// Candidate URLs are popped from a source list and published to a
// push-delivery broker with a fixed delay. The broker calls back into the
// orchestrator's signed webhook, which verifies and stores each payload.
//
// Binaries: orchestrator (webhook + health), crawler (dispatcher loop),
// seed_urls (operator CLI for the source list).

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
