//! Adapter over a synchronous browser-style store
//!
//! Browser storage can be missing (server-side rendering), disabled
//! (private browsing) or full. Persistence here is best effort: failures are
//! logged, forwarded to an optional error hook, and never fail the caller.

use super::adapter::{AdapterConfig, AdapterKind, ErrorHook, Namespace, StorageAdapter};
use super::backend::{BackendError, BackendResult, WebStorage};
use super::envelope;
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Namespaced TTL storage over a `WebStorage`
pub struct WebStorageAdapter {
    store: Option<Arc<dyn WebStorage>>,
    namespace: Namespace,
    default_ttl: Option<u64>,
    error_hook: Option<ErrorHook>,
}

impl WebStorageAdapter {
    pub fn new(store: Arc<dyn WebStorage>, config: AdapterConfig) -> Result<Self> {
        Self::build(Some(store), config)
    }

    /// Adapter with no backing store at all. Reads return nothing and writes
    /// are skipped, as when browser storage does not exist.
    pub fn detached(config: AdapterConfig) -> Result<Self> {
        Self::build(None, config)
    }

    fn build(store: Option<Arc<dyn WebStorage>>, config: AdapterConfig) -> Result<Self> {
        Ok(Self {
            store,
            namespace: config.namespace()?,
            default_ttl: config.default_ttl,
            error_hook: None,
        })
    }

    /// Forward every swallowed failure to `hook`
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Whether a backing store is attached and currently writable
    pub fn is_available(&self) -> bool {
        self.store.as_ref().is_some_and(|store| store.is_available())
    }

    /// Write and report failures instead of swallowing them
    pub fn try_set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        let store = self.store_for("set_item", key)?;
        let raw = envelope::encode(value, ttl, self.default_ttl)?;
        store
            .set_item(&self.namespace.key(key), &raw)
            .map_err(|e| StorageError::backend("set_item", Some(key), e))
    }

    /// Best-effort write
    pub fn set(&self, key: &str, value: &str, ttl: Option<u64>) {
        if let Err(err) = self.try_set(key, value, ttl) {
            self.report(&err);
        }
    }

    /// Read with lazy expiry
    pub fn get(&self, key: &str) -> Option<String> {
        let store = match self.store_for("get_item", key) {
            Ok(store) => store,
            Err(err) => {
                self.report(&err);
                return None;
            }
        };

        let physical = self.namespace.key(key);
        let raw = match store.get_item(&physical) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.report(&StorageError::backend("get_item", Some(key), e));
                return None;
            }
        };

        let decoded = envelope::decode(&raw);
        if decoded.expired {
            debug!(namespace = %self.namespace, key, "evicting expired item");
            if let Err(e) = store.remove_item(&physical) {
                self.report(&StorageError::backend("remove_item", Some(key), e));
            }
            return None;
        }

        Some(decoded.value)
    }

    /// Best-effort delete
    pub fn remove(&self, key: &str) {
        let result = self.store_for("remove_item", key).and_then(|store| {
            store
                .remove_item(&self.namespace.key(key))
                .map_err(|e| StorageError::backend("remove_item", Some(key), e))
        });
        if let Err(err) = result {
            self.report(&err);
        }
    }

    /// Best-effort delete of every key in this namespace
    pub fn clear_namespace(&self) {
        let store = match self.store_for("clear", "") {
            Ok(store) => store,
            Err(err) => {
                self.report(&err);
                return;
            }
        };

        let keys = match self.physical_keys(store.as_ref()) {
            Ok(keys) => keys,
            Err(e) => {
                self.report(&StorageError::backend("clear", None, e));
                return;
            }
        };

        // Keep going past individual failures
        for key in &keys {
            if let Err(e) = store.remove_item(key) {
                let logical = self.namespace.strip(key);
                self.report(&StorageError::backend("clear", logical, e));
            }
        }
        debug!(namespace = %self.namespace, removed = keys.len(), "cleared namespace");
    }

    /// Logical keys of this namespace
    pub fn keys(&self) -> Vec<String> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };

        match self.physical_keys(store.as_ref()) {
            Ok(keys) => keys
                .iter()
                .filter_map(|key| self.namespace.strip(key))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                self.report(&StorageError::backend("get_all_keys", None, e));
                Vec::new()
            }
        }
    }

    /// Snapshot the physical keys of this namespace before any mutation,
    /// since removing while walking `key(i)` shifts indices
    fn physical_keys(&self, store: &dyn WebStorage) -> BackendResult<Vec<String>> {
        let mut keys = store.all_keys()?;
        keys.retain(|key| self.namespace.owns(key));
        Ok(keys)
    }

    fn store_for(&self, operation: &'static str, key: &str) -> Result<&Arc<dyn WebStorage>> {
        self.store.as_ref().ok_or_else(|| {
            let key = (!key.is_empty()).then_some(key);
            StorageError::backend(operation, key, BackendError::Unavailable)
        })
    }

    fn report(&self, err: &StorageError) {
        if err.is_soft_failure() {
            warn!(namespace = %self.namespace, "browser storage degraded: {}", err);
        } else {
            error!(namespace = %self.namespace, "browser storage failure: {}", err);
        }
        if let Some(hook) = &self.error_hook {
            hook(err);
        }
    }
}

impl fmt::Debug for WebStorageAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebStorageAdapter")
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .field("attached", &self.store.is_some())
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

#[async_trait]
impl StorageAdapter for WebStorageAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Web
    }

    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn set_item(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        self.set(key, value, ttl);
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.clear_namespace();
        Ok(())
    }

    async fn get_all_keys(&self) -> Vec<String> {
        self.keys()
    }
}
