//! Key-value secret stores consulted on every request.
//!
//! The gateway never caches what a store returns, so rotating a secret in the
//! backing store takes effect on the next request.

use std::collections::HashMap;
use std::sync::RwLock;

/// Opaque key-value lookup for per-alias settings and tokens
pub trait SecretStore: Send + Sync {
    /// Current value for `key`, if any
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment on every lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory store, used for embedding and tests
#[derive(Debug, Default)]
pub struct StaticSecretStore {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn set<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.into(), value.into());
        }
    }

    /// Remove a value
    pub fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticSecretStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl SecretStore for StaticSecretStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}
