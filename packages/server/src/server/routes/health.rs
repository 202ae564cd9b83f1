use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::kernel::ServerDeps;

const STORE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub services: ServicesHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesHealth {
    pub store: String,
}

/// Health check endpoint
///
/// Checks content store readiness, bounded by a 5 second timeout.
///
/// Always returns 200 OK; the body says whether the service is usable.
pub async fn health_handler(Extension(deps): Extension<Arc<ServerDeps>>) -> Json<HealthResponse> {
    let store_healthy = match tokio::time::timeout(
        STORE_CHECK_TIMEOUT,
        deps.content_store.is_ready(),
    )
    .await
    {
        Ok(Ok(ready)) => {
            if !ready {
                tracing::warn!("Content store reachable but not ready");
            }
            ready
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Content store readiness check failed");
            false
        }
        Err(_) => {
            tracing::warn!("Content store readiness check timed out (>5s)");
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "unhealthy" };

    Json(HealthResponse {
        status: status.to_string(),
        service: "orchestrator".to_string(),
        services: ServicesHealth {
            store: status.to_string(),
        },
    })
}
