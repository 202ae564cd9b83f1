//! Errors surfaced to the broker by the webhook endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Webhook failures, each mapped to one HTTP status.
///
/// Messages are fixed strings: verification failure reasons are logged
/// server-side and never echoed to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing Upstash-Signature header")]
    MissingSignature,

    #[error("QSTASH_SIGNING_KEY not configured")]
    SigningKeyNotConfigured,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid JSON payload")]
    InvalidPayload,
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::SigningKeyNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::InvalidPayload => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
