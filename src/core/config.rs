//! # Configuration Module
//!
//! Static gateway configuration: listener settings, upstream settings, the
//! reserved route tokens, and the list of aliases. It is loaded once at
//! startup from YAML, patched from `GATEWAY_*` environment variables, and
//! validated as a whole.
//!
//! Secrets are deliberately absent from this file. Each alias only names the
//! store keys its values live under (see [`AliasBinding`]); the values are read
//! from a [`SecretStore`](crate::discovery::SecretStore) on every request.

use crate::core::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main gateway configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration
    pub server: ServerSettings,

    /// Upstream repository service configuration
    pub upstream: UpstreamSettings,

    /// Reserved sub-route tokens
    pub routes: RouteSettings,

    /// Alias definitions
    pub aliases: Vec<AliasDefinition>,

    /// Logging settings
    pub observability: ObservabilityConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
        }
    }
}

/// Upstream repository service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Root of the upstream repository service
    pub base_url: String,

    /// Store key whose value, when set, replaces `base_url`
    pub base_url_key: String,

    /// Store key of the token used by aliases without their own
    pub fallback_token_key: String,

    /// Domain that Space application hosts live under
    pub space_domain: String,

    /// User agent sent upstream
    pub user_agent: String,

    /// Upstream request timeout; unset relies on the transport's own limits
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://huggingface.co".to_string(),
            base_url_key: "HF_ENDPOINT".to_string(),
            fallback_token_key: "HF_TOKEN".to_string(),
            space_domain: "hf.space".to_string(),
            user_agent: concat!("repo-alias-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

/// Reserved sub-route tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Token selecting the metadata route
    pub info_command: String,

    /// Token selecting the listing route
    pub files_command: String,

    /// Token selecting the Space passthrough; disabled when unset
    pub space_command: Option<String>,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            info_command: "__info__".to_string(),
            files_command: "__files__".to_string(),
            space_command: None,
        }
    }
}

/// One alias as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasDefinition {
    /// Public route segment
    pub name: String,

    /// Prefix of the store keys; defaults to the upper-cased name
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl AliasDefinition {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            key_prefix: None,
        }
    }
}

/// Store keys for one alias, computed once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasBinding {
    pub name: String,
    pub id_key: String,
    pub type_key: String,
    pub revision_key: String,
    pub token_key: String,
}

impl AliasBinding {
    /// Derive the key set for an alias definition
    ///
    /// `my-repo` becomes prefix `MY_REPO`, giving `MY_REPO_ID`, `MY_REPO_TYPE`,
    /// `MY_REPO_REVISION` and `MY_REPO_TOKEN`.
    pub fn from_definition(definition: &AliasDefinition) -> Self {
        let prefix = definition
            .key_prefix
            .clone()
            .unwrap_or_else(|| definition.name.to_ascii_uppercase().replace('-', "_"));

        Self {
            name: definition.name.clone(),
            id_key: format!("{}_ID", prefix),
            type_key: format!("{}_TYPE", prefix),
            revision_key: format!("{}_REVISION", prefix),
            token_key: format!("{}_TOKEN", prefix),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub logging: LogConfig,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(crate::config_error!("Invalid log format: {}", other)),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file, apply overrides and validate
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without overrides
    pub fn from_yaml(content: &str) -> GatewayResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment variable overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `GATEWAY_<SECTION>_<FIELD>` overrides from an arbitrary lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> GatewayResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("GATEWAY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Some(port) = lookup("GATEWAY_SERVER_HTTP_PORT") {
            self.server.http_port = port
                .parse()
                .map_err(|e| crate::config_error!("Invalid GATEWAY_SERVER_HTTP_PORT: {}", e))?;
        }

        if let Some(base_url) = lookup("GATEWAY_UPSTREAM_BASE_URL") {
            self.upstream.base_url = base_url;
        }

        if let Some(timeout) = lookup("GATEWAY_UPSTREAM_TIMEOUT") {
            self.upstream.timeout = Some(
                humantime::parse_duration(&timeout)
                    .map_err(|e| crate::config_error!("Invalid GATEWAY_UPSTREAM_TIMEOUT: {}", e))?,
            );
        }

        if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
            self.observability.logging.level = level;
        }

        if let Some(format) = lookup("GATEWAY_LOG_FORMAT") {
            self.observability.logging.format = format.parse()?;
        }

        if let Some(aliases) = lookup("GATEWAY_ALIASES") {
            for name in aliases.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !self.aliases.iter().any(|a| a.name == name) {
                    self.aliases.push(AliasDefinition::new(name));
                }
            }
        }

        Ok(())
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        if self.server.bind_address.is_empty() {
            errors.push("bind_address cannot be empty".to_string());
        }

        match Url::parse(&self.upstream.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "upstream base_url must be http or https, got '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("upstream base_url is invalid: {}", e)),
        }

        if self.upstream.space_domain.is_empty() {
            errors.push("upstream space_domain cannot be empty".to_string());
        }

        if self.upstream.timeout == Some(Duration::ZERO) {
            errors.push("upstream timeout must be greater than 0".to_string());
        }

        let mut reserved = vec![
            ("info_command", self.routes.info_command.as_str()),
            ("files_command", self.routes.files_command.as_str()),
        ];
        if let Some(ref space) = self.routes.space_command {
            reserved.push(("space_command", space.as_str()));
        }

        for (field, token) in &reserved {
            if token.is_empty() || token.contains('/') {
                errors.push(format!("routes.{} must be a single non-empty path segment", field));
            }
        }

        let tokens: HashSet<&str> = reserved.iter().map(|(_, token)| *token).collect();
        if tokens.len() != reserved.len() {
            errors.push("reserved route tokens must be distinct".to_string());
        }

        let mut seen = HashSet::new();
        for alias in &self.aliases {
            if alias.name.is_empty() || alias.name.contains('/') {
                errors.push(format!(
                    "alias '{}' must be a single non-empty path segment",
                    alias.name
                ));
            }
            if !seen.insert(alias.name.as_str()) {
                errors.push(format!("alias '{}' is defined more than once", alias.name));
            }
            if let Some(ref prefix) = alias.key_prefix {
                if prefix.is_empty() {
                    errors.push(format!("alias '{}' has an empty key_prefix", alias.name));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(crate::config_error!(
                "Configuration validation failed: {}",
                errors.join("; ")
            ))
        }
    }

    /// Store key bindings for every configured alias
    pub fn alias_bindings(&self) -> Vec<AliasBinding> {
        self.aliases.iter().map(AliasBinding::from_definition).collect()
    }
}
