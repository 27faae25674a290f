//! # Shop Gateway - Main Entry Point
//!
//! Startup sequence:
//! 1. Load `GatewayConfig` (YAML file, then `GATEWAY_*` environment overrides)
//! 2. Initialize logging and the Prometheus recorder
//! 3. Connect the message bus, the cache and the media host
//! 4. Build the services and the router, then serve until SIGTERM or Ctrl+C
//!
//! In-flight requests are allowed to finish after a shutdown signal.

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use shop_gateway::observability::{logging, metrics};
use shop_gateway::rpc::MessageRouter;
use shop_gateway::{AppState, Backends, GatewayConfig, GatewayServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load().await.context("Failed to load configuration")?;

    logging::init(&config.observability.logging);

    info!("🚀 Starting Shop Gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("✅ Configuration loaded and validated");

    let metrics_handle = if config.observability.metrics.enabled {
        let handle = metrics::install().context("Failed to install metrics recorder")?;
        info!("📈 Prometheus metrics on {}", config.observability.metrics.endpoint_path);
        Some(handle)
    } else {
        None
    };

    info!("🔗 Connecting backends...");
    let backends = Backends::connect(&config, Arc::new(MessageRouter::new()))
        .await
        .context("Failed to connect backends")?;

    let state = AppState::build(&config, backends, metrics_handle).context("Failed to build services")?;
    let enabled: Vec<&str> = state.oauth.enabled().iter().map(|provider| provider.as_str()).collect();
    if enabled.is_empty() {
        warn!("⚠️  No OAuth provider configured");
    } else {
        info!("🔑 OAuth providers: {}", enabled.join(", "));
    }

    let server = GatewayServer::new(state, &config).context("Failed to create server")?;
    info!("🌐 Shop Gateway ready on {}", server.bind_addr());

    server.start(shutdown_signal()).await.context("Server error")?;

    info!("✅ Shop Gateway shutdown complete");
    Ok(())
}

/// Resolves on SIGTERM or Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
        _ = ctrl_c => info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        _ = terminate => info!("📡 Received SIGTERM, initiating graceful shutdown..."),
    }
    info!("⏳ Waiting for in-flight requests to complete...");
}
