//! Push candidate URLs onto the crawler's source list.
//!
//! ```text
//! seed_urls https://a.example https://b.example
//! cat urls.txt | seed_urls --stdin
//! seed_urls --concept "RSI divergence"
//! ```

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;
use pipeline_core::domains::dispatch::{concept_urls, partition_lines, DEFAULT_SEARCH_URL};
use pipeline_core::kernel::RedisUrlSource;
use pipeline_core::SourceConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "seed_urls")]
#[command(about = "Push candidate URLs onto the crawler's Redis list")]
struct Cli {
    /// URLs to push (absolute http/https)
    urls: Vec<String>,

    /// Also read URLs from stdin, one per line
    #[arg(long)]
    stdin: bool,

    /// Expand a concept into search-query URLs
    #[arg(long)]
    concept: Vec<String>,

    /// Search endpoint used for --concept
    #[arg(long, default_value = DEFAULT_SEARCH_URL)]
    search_url: String,

    /// Redis URL (defaults to REDIS_URL)
    #[arg(long)]
    redis_url: Option<String>,

    /// List key (defaults to SOURCE_LIST_KEY)
    #[arg(long)]
    key: Option<String>,

    /// Print what would be pushed without touching Redis
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let env = SourceConfig::from_env();

    let mut lines = cli.urls.clone();
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            lines.push(line.context("Failed to read stdin")?);
        }
    }

    let (mut urls, rejected) = partition_lines(lines.iter().map(String::as_str));
    for (line, e) in &rejected {
        tracing::warn!(input = %line, error = %e, "Skipping invalid URL");
    }

    for concept in &cli.concept {
        let expanded = concept_urls(concept, &cli.search_url)
            .with_context(|| format!("Failed to expand concept {:?}", concept))?;
        tracing::info!(concept = %concept, count = expanded.len(), "Expanded concept");
        urls.extend(expanded);
    }

    if urls.is_empty() {
        anyhow::bail!("No valid URLs to push");
    }

    if cli.dry_run {
        for url in &urls {
            println!("{}", url);
        }
        return Ok(());
    }

    let redis_url = cli.redis_url.unwrap_or(env.redis_url);
    let key = cli.key.unwrap_or(env.source_list_key);

    let source = RedisUrlSource::connect(&redis_url, key)
        .await
        .context("Failed to open URL source")?;
    let len = source.push_urls(&urls).await?;

    tracing::info!(
        pushed = urls.len(),
        skipped = rejected.len(),
        list_len = len,
        key = %source.key(),
        "Seeded URL source"
    );

    Ok(())
}
