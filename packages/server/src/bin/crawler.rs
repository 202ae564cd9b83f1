//! Crawler: drains the Redis source list into the push-delivery broker.
//!
//! Runs until Ctrl-C. A failed publish drops that job and the loop goes on;
//! only configuration problems stop the process.

use std::sync::Arc;

use anyhow::{Context, Result};
use pipeline_core::domains::dispatch::{Dispatcher, DispatcherConfig};
use pipeline_core::kernel::{QStashAdapter, RedisUrlSource};
use pipeline_core::CrawlerConfig;
use qstash_client::QStashClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipeline_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting crawler");

    let config = CrawlerConfig::from_env().context("Failed to load configuration")?;

    let qstash = QStashClient::with_timeout(
        config.qstash_url.clone(),
        config.qstash_token.clone(),
        config.qstash_timeout,
    )
    .context("Failed to create broker client")?;
    tracing::info!(publish_url = %qstash.publish_url(), "Broker client ready");

    let source = RedisUrlSource::connect(&config.redis_url, config.source_list_key.clone())
        .await
        .context("Failed to open URL source")?;
    tracing::info!(key = %source.key(), "Connected to URL source");

    let dispatcher = Dispatcher::new(
        Arc::new(source),
        Arc::new(QStashAdapter::new(Arc::new(qstash))),
        DispatcherConfig {
            publish_timeout: config.qstash_timeout,
            ..DispatcherConfig::default()
        },
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        signal_token.cancel();
    });

    dispatcher
        .run(shutdown)
        .await
        .context("Dispatcher stopped with an error")?;

    tracing::info!("Crawler stopped");
    Ok(())
}
