// Main entry point for the orchestrator (webhook ingestion) service

use std::sync::Arc;

use anyhow::{Context, Result};
use pipeline_core::domains::ingestion::SigningKey;
use pipeline_core::kernel::{ServerDeps, WeaviateAdapter};
use pipeline_core::{server::build_app, OrchestratorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weaviate_client::WeaviateClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting orchestrator");

    // Load configuration
    let config = OrchestratorConfig::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let signing_key = match config.qstash_signing_key.as_deref() {
        Some(raw) => Some(Arc::new(
            SigningKey::from_config(raw).context("QSTASH_SIGNING_KEY is not a valid Ed25519 key")?,
        )),
        None => {
            tracing::warn!("QSTASH_SIGNING_KEY not set; webhook deliveries will be rejected");
            None
        }
    };

    let weaviate = WeaviateClient::new(&config.weaviate_url)
        .context("Failed to create content store client")?;
    let content_store = Arc::new(WeaviateAdapter::new(Arc::new(weaviate)));

    let server_deps = Arc::new(ServerDeps::new(
        content_store,
        signing_key,
        config.deduplicate,
    ));

    // Build application
    let app = build_app(server_deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Orchestrator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
