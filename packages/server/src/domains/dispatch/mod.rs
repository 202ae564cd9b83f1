//! Dispatch domain: URL source → push-delivery broker.

pub mod dispatcher;
pub mod error;
pub mod seed;

pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig};
pub use error::{DispatchError, DispatchPolicy};
pub use seed::{concept_urls, partition_lines, validate_url, SeedError, DEFAULT_SEARCH_URL};
