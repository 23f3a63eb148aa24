//! pgcache server entry point.
//!
//! Loads configuration, connects and provisions the cache, starts the
//! background cleanup loop and serves the cache tools over MCP stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use pgcache_core::cache::{CleanupScheduler, PgCleanup};
use pgcache_core::{CacheConfig, PgCache};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = CacheConfig::load()?;
    tracing::info!(
        schema = config.schema_name.as_deref().unwrap_or("<default>"),
        table = %config.table_name,
        cleanup_interval_ms = config.cleanup_interval_ms,
        "Starting pgcache server on stdio transport"
    );

    let cache = PgCache::connect(&config).await?;
    let shutdown = CancellationToken::new();

    let cleanup = CleanupScheduler::new(PgCleanup::from_config(cache.db().clone(), &config), config.cleanup_interval())
        .spawn(&shutdown);

    let handler = handler::PgCacheServer::new(cache.clone(), shutdown.clone());
    let server = serve_server(handler, stdio()).await?;

    tokio::select! {
        quit = server.waiting() => {
            let reason = quit?;
            tracing::info!(?reason, "MCP session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
        }
    }

    shutdown.cancel();
    cleanup.shutdown().await;
    cache.db().close().await;

    Ok(())
}
