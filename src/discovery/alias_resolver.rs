//! # Alias Resolver
//!
//! Maps an alias token to the [`RepositoryConfig`] it stands for. The key set
//! of each alias is fixed at startup ([`AliasBinding`]); the values behind
//! those keys are looked up in the [`SecretStore`] on every call and never
//! memoized.
//!
//! Resolution rules:
//! - the id is required, otherwise `missing <ALIAS>_ID`
//! - the type defaults to `model` and is normalized by [`RepoScope::parse`]
//! - the revision defaults to `main`
//! - the token falls back to the global fallback token, then to none
//!
//! Values that are present but blank count as absent.

use crate::core::config::{AliasBinding, UpstreamSettings};
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{RepoScope, RepositoryConfig, DEFAULT_REVISION};
use crate::discovery::secrets::SecretStore;
use std::sync::Arc;
use tracing::debug;

/// Resolves aliases against a secret store
pub struct AliasResolver {
    /// Aliases in configuration order
    bindings: Vec<AliasBinding>,

    /// Backing store, read on every resolution
    store: Arc<dyn SecretStore>,

    /// Default upstream root
    base_url: String,

    /// Store key overriding `base_url`
    base_url_key: String,

    /// Store key of the fallback token
    fallback_token_key: String,
}

impl AliasResolver {
    /// Create a resolver for the given aliases
    pub fn new(
        bindings: Vec<AliasBinding>,
        upstream: &UpstreamSettings,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            bindings,
            store,
            base_url: upstream.base_url.clone(),
            base_url_key: upstream.base_url_key.clone(),
            fallback_token_key: upstream.fallback_token_key.clone(),
        }
    }

    /// Whether `alias` is one of the configured aliases
    pub fn is_known(&self, alias: &str) -> bool {
        self.binding(alias).is_some()
    }

    /// Configured alias names, in configuration order
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    /// Current upstream root, without trailing slashes
    pub fn base_url(&self) -> String {
        let base = self
            .lookup(&self.base_url_key)
            .unwrap_or_else(|| self.base_url.clone());
        base.trim_end_matches('/').to_string()
    }

    /// Resolve one alias
    pub fn resolve(&self, alias: &str) -> GatewayResult<RepositoryConfig> {
        let binding = self
            .binding(alias)
            .ok_or_else(|| GatewayError::not_found(format!("/{}", alias)))?;

        let repo_id = self
            .lookup(&binding.id_key)
            .ok_or_else(|| crate::config_error!("missing {}", binding.id_key))?;

        let scope = match self.lookup(&binding.type_key) {
            Some(raw) => RepoScope::parse(&raw)?,
            None => RepoScope::default(),
        };

        let revision = self
            .lookup(&binding.revision_key)
            .unwrap_or_else(|| DEFAULT_REVISION.to_string());

        let token = self
            .lookup(&binding.token_key)
            .or_else(|| self.lookup(&self.fallback_token_key));

        debug!(
            alias = %alias,
            repo_id = %repo_id,
            scope = %scope,
            revision = %revision,
            authenticated = token.is_some(),
            "Resolved alias"
        );

        Ok(RepositoryConfig {
            repo_id,
            scope,
            revision,
            token,
        })
    }

    /// Resolve every configured alias, keeping each failure separate
    pub fn resolve_all(&self) -> Vec<(&str, GatewayResult<RepositoryConfig>)> {
        self.bindings
            .iter()
            .map(|binding| (binding.name.as_str(), self.resolve(&binding.name)))
            .collect()
    }

    fn binding(&self, alias: &str) -> Option<&AliasBinding> {
        self.bindings.iter().find(|b| b.name == alias)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AliasDefinition;
    use crate::discovery::secrets::StaticSecretStore;

    fn resolver(store: Arc<StaticSecretStore>) -> AliasResolver {
        let bindings = vec![
            AliasBinding::from_definition(&AliasDefinition::new("neuro")),
            AliasBinding::from_definition(&AliasDefinition::new("auditor")),
        ];
        AliasResolver::new(bindings, &UpstreamSettings::default(), store)
    }

    #[test]
    fn test_resolve_with_defaults() {
        let store = Arc::new(StaticSecretStore::from_iter([("NEURO_ID", "owner/neuro")]));
        let config = resolver(store).resolve("neuro").unwrap();

        assert_eq!(config.repo_id, "owner/neuro");
        assert_eq!(config.scope, RepoScope::Models);
        assert_eq!(config.label(), "model");
        assert_eq!(config.revision, "main");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_resolve_all_fields() {
        let store = Arc::new(StaticSecretStore::from_iter([
            ("AUDITOR_ID", "owner/audit-data"),
            ("AUDITOR_TYPE", "Datasets"),
            ("AUDITOR_REVISION", "v2"),
            ("AUDITOR_TOKEN", "hf_alias"),
            ("HF_TOKEN", "hf_global"),
        ]));
        let config = resolver(store).resolve("auditor").unwrap();

        assert_eq!(config.scope, RepoScope::Datasets);
        assert_eq!(config.revision, "v2");
        assert_eq!(config.token.as_deref(), Some("hf_alias"));
    }

    #[test]
    fn test_missing_id_names_the_key() {
        let store = Arc::new(StaticSecretStore::from_iter([("NEURO_TYPE", "model")]));
        let error = resolver(store).resolve("neuro").unwrap_err();
        assert_eq!(error, GatewayError::config("missing NEURO_ID"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let store = Arc::new(StaticSecretStore::from_iter([
            ("NEURO_ID", "owner/neuro"),
            ("NEURO_TYPE", "  "),
            ("NEURO_REVISION", ""),
        ]));
        let config = resolver(store.clone()).resolve("neuro").unwrap();
        assert_eq!(config.scope, RepoScope::Models);
        assert_eq!(config.revision, "main");

        store.set("NEURO_ID", " ");
        assert!(resolver(store).resolve("neuro").is_err());
    }

    #[test]
    fn test_invalid_type() {
        let store = Arc::new(StaticSecretStore::from_iter([
            ("NEURO_ID", "owner/neuro"),
            ("NEURO_TYPE", "notebook"),
        ]));
        let error = resolver(store).resolve("neuro").unwrap_err();
        assert_eq!(
            error.to_string(),
            "repo type must be 'model', 'dataset', or 'space'"
        );
    }

    #[test]
    fn test_fallback_token() {
        let store = Arc::new(StaticSecretStore::from_iter([
            ("NEURO_ID", "owner/neuro"),
            ("HF_TOKEN", "hf_global"),
        ]));
        let config = resolver(store).resolve("neuro").unwrap();
        assert_eq!(config.token.as_deref(), Some("hf_global"));
    }

    #[test]
    fn test_rotation_is_visible_immediately() {
        let store = Arc::new(StaticSecretStore::from_iter([("NEURO_ID", "owner/one")]));
        let resolver = resolver(store.clone());
        assert_eq!(resolver.resolve("neuro").unwrap().repo_id, "owner/one");

        store.set("NEURO_ID", "owner/two");
        store.set("NEURO_TOKEN", "hf_rotated");
        let config = resolver.resolve("neuro").unwrap();
        assert_eq!(config.repo_id, "owner/two");
        assert_eq!(config.token.as_deref(), Some("hf_rotated"));
    }

    #[test]
    fn test_resolve_all_isolates_failures() {
        let store = Arc::new(StaticSecretStore::from_iter([("NEURO_ID", "owner/neuro")]));
        let resolver = resolver(store);
        let results = resolver.resolve_all();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "neuro");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "auditor");
        assert_eq!(
            results[1].1.as_ref().unwrap_err().to_string(),
            "missing AUDITOR_ID"
        );
    }

    #[test]
    fn test_base_url_override() {
        let store = Arc::new(StaticSecretStore::new());
        let resolver = resolver(store.clone());
        assert_eq!(resolver.base_url(), "https://huggingface.co");

        store.set("HF_ENDPOINT", "https://mirror.example.com//");
        assert_eq!(resolver.base_url(), "https://mirror.example.com");
    }

    #[test]
    fn test_unknown_alias() {
        let resolver = resolver(Arc::new(StaticSecretStore::new()));
        assert!(!resolver.is_known("other"));
        assert!(matches!(
            resolver.resolve("other"),
            Err(GatewayError::RouteNotFound { .. })
        ));
    }
}
