//! Ingestion domain: signed broker callbacks → content store.

pub mod error;
pub mod signature;
pub mod testing;
pub mod webhook;

pub use error::WebhookError;
pub use signature::{
    verify_request, SigningKey, VerifiedClaims, VerifiedWebhook, WebhookEnvelope,
};
pub use webhook::{
    ingest, object_id_for, router, ProcessedRecord, StorageStatus, WebhookAck, WebhookState,
    INGEST_PATH, RAW_URL_CLASS,
};
