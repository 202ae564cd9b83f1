//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod redis_source;
pub mod test_dependencies;
pub mod traits;

pub use deps::{QStashAdapter, ServerDeps, WeaviateAdapter};
pub use redis_source::{RedisUrlSource, DEFAULT_LIST_KEY};
pub use test_dependencies::{
    PublishBehavior, PublishedJob, TestContentStore, TestDependencies, TestPublisher,
    TestUrlSource,
};
pub use traits::*;
