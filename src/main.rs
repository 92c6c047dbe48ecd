//! # Repository Alias Gateway - Main Entry Point
//!
//! Loads configuration, installs logging, builds the server over the process
//! environment as secret store and serves until SIGINT or SIGTERM.
//!
//! Configuration comes from `GATEWAY_CONFIG_PATH` (default
//! `config/gateway.yaml`). When the default file does not exist the built-in
//! defaults are used, still subject to `GATEWAY_*` overrides and validation.

use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use repo_alias_gateway::observability::init_logging;
use repo_alias_gateway::{EnvSecretStore, GatewayConfig, GatewayResult, GatewayServer};

const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

#[tokio::main]
async fn main() -> GatewayResult<()> {
    let config = match load_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.observability.logging)?;

    info!("Starting repository alias gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = GatewayServer::new(&config, Arc::new(EnvSecretStore))?;
    info!(
        aliases = config.aliases.len(),
        bind_addr = %server.bind_addr(),
        "Gateway configured"
    );

    if let Err(e) = server.serve(shutdown_signal()).await {
        error!("Gateway server failed: {}", e);
        std::process::exit(1);
    }

    info!("Gateway shutdown complete");
    Ok(())
}

/// Load configuration from `GATEWAY_CONFIG_PATH` or the default location
async fn load_config() -> GatewayResult<GatewayConfig> {
    match std::env::var("GATEWAY_CONFIG_PATH") {
        Ok(path) => GatewayConfig::load_from_file(&path).await,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            GatewayConfig::load_from_file(DEFAULT_CONFIG_PATH).await
        }
        Err(_) => {
            let mut config = GatewayConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, beginning graceful shutdown"),
        _ = terminate => info!("SIGTERM received, beginning graceful shutdown"),
    }
}
