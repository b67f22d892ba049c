//! harbor-proxy entry point.
//!
//! Boots the offline proxy behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use harbor_client::{FetchConfig, HttpFetcher};
use harbor_core::{AppConfig, CacheDb, EmptyDataStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod retry;
mod session;
mod state;
mod tools;

const RETRY_POLL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "Starting harbor proxy on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher = HttpFetcher::new(FetchConfig::from_app_config(&config))?;
    let state = state::ProxyState::build(config, Arc::new(cache), Arc::new(fetcher), Arc::new(EmptyDataStore))?;

    let ticker = retry::spawn(state.clone(), RETRY_POLL);

    let handler = handler::HarborServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    ticker.abort();

    Ok(())
}
