//! # Structured Logging
//!
//! Installs the process-wide `tracing` subscriber. `RUST_LOG` wins when set;
//! otherwise the configured level applies to this crate and `tower_http`.

use crate::core::config::{LogConfig, LogFormat};
use crate::core::error::GatewayResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level
pub fn default_directive(level: &str) -> String {
    format!("repo_alias_gateway={level},tower_http={level}", level = level)
}

/// Build the filter from `RUST_LOG` or the configured level
pub fn env_filter(config: &LogConfig) -> GatewayResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive(&config.level))
            .map_err(|e| crate::config_error!("Invalid log level '{}': {}", config.level, e)),
    }
}

/// Initialize logging; fails if a global subscriber is already installed
pub fn init_logging(config: &LogConfig) -> GatewayResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init(),
    };

    result.map_err(|e| crate::config_error!("Failed to initialize logging: {}", e))
}
