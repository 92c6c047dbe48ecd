//! # Core Types
//!
//! Data structures shared by the resolver, the dispatcher and the relay. All of
//! them are built fresh for each request and dropped with the response.

use crate::core::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Revision used when an alias does not pin one
pub const DEFAULT_REVISION: &str = "main";

/// Repository category of an upstream repository
///
/// The upstream API addresses categories by their plural form (`models`) while
/// summaries and logs use the singular label (`model`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepoScope {
    #[default]
    Models,
    Datasets,
    Spaces,
}

impl RepoScope {
    /// Plural path segment used by the upstream API
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoScope::Models => "models",
            RepoScope::Datasets => "datasets",
            RepoScope::Spaces => "spaces",
        }
    }

    /// Singular label derived from the scope
    pub fn label(&self) -> &'static str {
        match self {
            RepoScope::Models => "model",
            RepoScope::Datasets => "dataset",
            RepoScope::Spaces => "space",
        }
    }

    /// Normalize a configured repository type.
    ///
    /// Matching is case-insensitive and accepts the plural form, so `Model`,
    /// `models` and `MODELS` all map to [`RepoScope::Models`].
    pub fn parse(raw: &str) -> GatewayResult<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let singular = lowered.strip_suffix('s').unwrap_or(&lowered);
        match singular {
            "model" => Ok(RepoScope::Models),
            "dataset" => Ok(RepoScope::Datasets),
            "space" => Ok(RepoScope::Spaces),
            _ => Err(GatewayError::config(
                "repo type must be 'model', 'dataset', or 'space'",
            )),
        }
    }
}

impl fmt::Display for RepoScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved upstream repository for one alias
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository id in `owner/name` form
    pub repo_id: String,

    /// Repository category
    pub scope: RepoScope,

    /// Branch, tag or commit that content is served from
    pub revision: String,

    /// Bearer token injected into forwarded requests
    pub token: Option<String>,
}

impl RepositoryConfig {
    /// Singular repository label (`model`, `dataset`, `space`)
    pub fn label(&self) -> &'static str {
        self.scope.label()
    }
}

// Tokens must never reach logs.
impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("repo_id", &self.repo_id)
            .field("scope", &self.scope)
            .field("revision", &self.revision)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Public summary of a resolved alias, as reported by the root route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub repo_id: String,
    pub repo_type: String,
    pub revision: String,
}

impl From<&RepositoryConfig> for RepositorySummary {
    fn from(config: &RepositoryConfig) -> Self {
        Self {
            repo_id: config.repo_id.clone(),
            repo_type: config.label().to_string(),
            revision: config.revision.clone(),
        }
    }
}

/// Sub-resource selected by the path after the alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCommand {
    /// Repository metadata
    Info,

    /// Directory listing; carries the path inferred from trailing segments
    Files { inferred_path: Option<String> },

    /// Raw file content at the given path
    Raw { path: String },

    /// Space application passthrough at the given path
    Space { path: String },
}

impl RouteCommand {
    /// Whether this route is restricted to `GET`/`HEAD`
    pub fn is_read_only(&self) -> bool {
        !matches!(self, RouteCommand::Space { .. })
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            RouteCommand::Info => "info",
            RouteCommand::Files { .. } => "files",
            RouteCommand::Raw { .. } => "raw",
            RouteCommand::Space { .. } => "space",
        }
    }
}

/// A parsed inbound path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Alias token the path starts with
    pub alias: String,

    /// Selected sub-resource
    pub command: RouteCommand,
}
