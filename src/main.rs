//! # Catalog Gateway - Main Entry Point
//!
//! Loads configuration, installs logging and metrics, connects the optional
//! cache store and serves the catalog API until SIGINT or SIGTERM.
//!
//! Configuration is read from `GATEWAY_CONFIG_PATH` (default
//! `config/gateway.yaml`); a missing file means built-in defaults. `GATEWAY_*`
//! environment variables override individual fields.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use catalog_gateway::gateway::{build_cache_store, AppState, GatewayServer};
use catalog_gateway::observability::{init_logging, install_exporter};
use catalog_gateway::provider::HttpProvider;
use catalog_gateway::{GatewayConfig, GatewayResult};

#[tokio::main]
async fn main() -> GatewayResult<()> {
    let config = load_config().await?;

    init_logging(&config.logging)?;
    info!("Starting catalog gateway v{}", env!("CARGO_PKG_VERSION"));

    let server = startup(&config).await.map_err(|e| {
        error!("Startup failed: {}", e);
        e
    })?;

    server.start(shutdown_signal()).await
}

async fn load_config() -> GatewayResult<GatewayConfig> {
    let config_path = std::env::var("GATEWAY_CONFIG_PATH")
        .unwrap_or_else(|_| "config/gateway.yaml".to_string());

    GatewayConfig::load_or_default(&config_path).await
}

/// Startup sequence: metrics, cache store, upstream client, server
async fn startup(config: &GatewayConfig) -> GatewayResult<GatewayServer> {
    install_exporter(&config.server.bind_address, config.server.metrics_port)?;

    let store = build_cache_store(config.cache.as_ref()).await?;

    let provider = HttpProvider::new(&config.upstream)?;
    info!(
        "Upstream provider: {} (timeout {:?})",
        config.upstream.base_url, config.upstream.timeout
    );

    let state = AppState::from_config(config, store, Arc::new(provider));
    let server = GatewayServer::new(config, state);

    info!("Catalog gateway ready on {}", server.bind_addr());
    Ok(server)
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
