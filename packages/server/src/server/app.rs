//! Application setup and server configuration.

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::domains::ingestion::{self, WebhookState};
use crate::kernel::ServerDeps;
use crate::server::routes::health_handler;

/// Build the Axum application router
///
/// - `POST /api/qstash`: broker webhook
/// - `GET /health`: readiness of the content store
pub fn build_app(server_deps: Arc<ServerDeps>) -> Router {
    let webhook_routes = ingestion::router(WebhookState {
        deps: server_deps.clone(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .merge(webhook_routes)
        .layer(Extension(server_deps))
        .layer(TraceLayer::new_for_http())
}
