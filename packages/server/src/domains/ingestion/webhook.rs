//! QStash delivery webhook.
//!
//! Receives the delayed job callbacks the broker pushes, verifies their
//! signature, then stores the payload in the content store.
//!
//! Acknowledgement means "authenticated and understood", not "durably
//! stored": a storage failure is logged and the broker still gets 200, so a
//! briefly unavailable index does not burn the broker's retry budget.
//! Callers cannot tell a stored record from one that was dropped.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::WebhookError;
use super::signature::{verify_request, VerifiedWebhook};
use crate::kernel::{ServerDeps, StoreOutcome, StoreRecord};

/// Path the broker delivers to.
pub const INGEST_PATH: &str = "/api/qstash";

/// Content-store class every ingested payload is filed under.
pub const RAW_URL_CLASS: &str = "RawURL";

/// State shared with the webhook handler.
#[derive(Clone)]
pub struct WebhookState {
    pub deps: Arc<ServerDeps>,
}

/// Body of a 200 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
    /// The payload's `id`, or `"unknown"` when it has none
    pub processed: Value,
}

/// What happened to the payload in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    Stored,
    /// Same job id already stored; redelivery collapsed
    Duplicate,
    StorageFailed,
}

/// Logical result of ingesting one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub id: Value,
    pub url: Option<String>,
    pub storage_status: StorageStatus,
}

/// Build the axum router for the webhook endpoint.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route(INGEST_PATH, post(handle_qstash_webhook))
        .with_state(state)
}

/// Handle one broker delivery.
///
/// `Bytes` captures the body untouched; nothing parses it before the
/// signature has been verified.
async fn handle_qstash_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookError> {
    let verified = verify_request(&headers, body, state.deps.signing_key.as_deref())?;
    let record = ingest(&state.deps, &verified).await?;

    Ok(Json(WebhookAck {
        ok: true,
        processed: record.id,
    }))
}

/// Parse a verified delivery and write it to the content store.
///
/// Only a parse failure is an error. Storage problems are absorbed into
/// [`StorageStatus::StorageFailed`].
pub async fn ingest(
    deps: &ServerDeps,
    webhook: &VerifiedWebhook,
) -> Result<ProcessedRecord, WebhookError> {
    let payload: Value = serde_json::from_slice(webhook.body()).map_err(|e| {
        tracing::error!(error = %e, "Invalid JSON payload");
        WebhookError::InvalidPayload
    })?;

    if !payload.is_object() {
        tracing::error!("JSON payload is not an object");
        return Err(WebhookError::InvalidPayload);
    }

    let job_id = payload.get("id").cloned();
    let processed = job_id
        .clone()
        .unwrap_or_else(|| Value::String("unknown".into()));
    let url = payload
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string);

    tracing::info!(
        processed = %processed,
        url = ?url,
        received_at = %webhook.received_at(),
        "Processing QStash webhook"
    );

    // Only a non-empty string id identifies a job; anything else is stored as new
    let object_id = match job_id.as_ref().and_then(Value::as_str) {
        Some(id) if deps.deduplicate && !id.is_empty() => Some(object_id_for(id)),
        _ => None,
    };

    let record = StoreRecord {
        class: RAW_URL_CLASS.to_string(),
        properties: payload,
        object_id,
    };

    let storage_status = match deps.content_store.store(&record).await {
        Ok(StoreOutcome::Stored) => {
            tracing::info!(processed = %processed, "Stored payload in content store");
            StorageStatus::Stored
        }
        Ok(StoreOutcome::Duplicate) => {
            tracing::info!(
                processed = %processed,
                "Payload already stored, redelivery ignored"
            );
            StorageStatus::Duplicate
        }
        Err(e) => {
            // Do not fail the webhook for storage errors
            tracing::error!(
                processed = %processed,
                error = %e,
                "Failed to store payload in content store"
            );
            StorageStatus::StorageFailed
        }
    };

    Ok(ProcessedRecord {
        id: processed,
        url,
        storage_status,
    })
}

/// Deterministic content-store id for a job id, so redeliveries of the same
/// job land on the same object.
pub fn object_id_for(job_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("urn:rawurl:{}", job_id).as_bytes())
}
