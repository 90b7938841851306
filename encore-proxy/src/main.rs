//! encore-proxy - catalog proxy functions
//!
//! Serves `spotify-search` and `music-link-generator` so that catalog
//! credentials never reach the client.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use encore_common::config::TomlConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use encore_proxy::config::{ProxyOverrides, ProxySettings};
use encore_proxy::{AppState, SpotifyClient};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "encore-proxy")]
#[command(about = "Encore catalog proxy functions", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (defaults to ~/.config/encore/config.toml)
    #[arg(short, long, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "ENCORE_PROXY_PORT")]
    port: Option<u16>,

    /// Catalog client id
    #[arg(long)]
    client_id: Option<String>,

    /// Catalog client secret
    #[arg(long)]
    client_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::resolve(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Starting encore-proxy v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let overrides = ProxyOverrides {
        host: args.host,
        port: args.port,
        client_id: args.client_id,
        client_secret: args.client_secret,
    };
    let settings = ProxySettings::resolve(&config, &overrides);

    let catalog = SpotifyClient::new(settings.credentials.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create catalog client: {}", e))?;
    if !catalog.has_credentials() {
        warn!("Catalog credentials are not configured; spotify-search will answer 500");
    }

    let app = encore_proxy::build_router(AppState::new(Arc::new(catalog)));

    let bind_address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("encore-proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
