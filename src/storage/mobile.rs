//! Adapter over an asynchronous mobile-style store
//!
//! Writes propagate backend failures to the caller. Reads degrade to "no
//! value" with a logged error. Batch operations map onto the store's batch
//! primitives with one backend round trip each.

use super::adapter::{AdapterConfig, AdapterKind, Namespace, StorageAdapter};
use super::backend::AsyncKeyValueStore;
use super::envelope;
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Namespaced TTL storage over an `AsyncKeyValueStore`
pub struct MobileStorageAdapter {
    store: Arc<dyn AsyncKeyValueStore>,
    namespace: Namespace,
    default_ttl: Option<u64>,
}

impl MobileStorageAdapter {
    pub fn new(store: Arc<dyn AsyncKeyValueStore>, config: AdapterConfig) -> Result<Self> {
        Ok(Self {
            store,
            namespace: config.namespace()?,
            default_ttl: config.default_ttl,
        })
    }

    /// Physical keys of this namespace, propagating backend failures
    async fn own_physical_keys(&self) -> Result<Vec<String>> {
        let keys = self
            .store
            .get_all_keys()
            .await
            .map_err(|e| StorageError::backend("get_all_keys", None, e))?;

        Ok(keys
            .into_iter()
            .filter(|key| self.namespace.owns(key))
            .collect())
    }

    /// Remove expired physical keys. Awaited rather than spawned so the
    /// eviction has happened by the time the read returns.
    async fn evict(&self, physical: &[String]) {
        let result = match physical {
            [] => return,
            [single] => self.store.remove_item(single).await,
            many => self.store.multi_remove(many).await,
        };

        match result {
            Ok(()) => debug!(
                namespace = %self.namespace,
                count = physical.len(),
                "evicted expired items"
            ),
            Err(e) => warn!(
                namespace = %self.namespace,
                "failed to evict expired items: {}", e
            ),
        }
    }
}

impl fmt::Debug for MobileStorageAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MobileStorageAdapter")
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageAdapter for MobileStorageAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Mobile
    }

    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn set_item(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        let raw = envelope::encode(value, ttl, self.default_ttl)?;
        self.store
            .set_item(&self.namespace.key(key), &raw)
            .await
            .map_err(|e| {
                error!(namespace = %self.namespace, key, "set_item failed: {}", e);
                StorageError::backend("set_item", Some(key), e)
            })
    }

    async fn get_item(&self, key: &str) -> Option<String> {
        let physical = self.namespace.key(key);
        let raw = match self.store.get_item(&physical).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(namespace = %self.namespace, key, "get_item failed: {}", e);
                return None;
            }
        };

        let decoded = envelope::decode(&raw);
        if decoded.expired {
            self.evict(&[physical]).await;
            return None;
        }
        Some(decoded.value)
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.store
            .remove_item(&self.namespace.key(key))
            .await
            .map_err(|e| StorageError::backend("remove_item", Some(key), e))
    }

    async fn clear(&self) -> Result<()> {
        let keys = self.own_physical_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }

        self.store
            .multi_remove(&keys)
            .await
            .map_err(|e| StorageError::backend("clear", None, e))?;

        debug!(namespace = %self.namespace, removed = keys.len(), "cleared namespace");
        Ok(())
    }

    async fn get_all_keys(&self) -> Vec<String> {
        match self.own_physical_keys().await {
            Ok(keys) => keys
                .iter()
                .filter_map(|key| self.namespace.strip(key))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                error!(namespace = %self.namespace, "get_all_keys failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn multi_get(&self, keys: &[String]) -> Vec<(String, Option<String>)> {
        let physical: Vec<String> = keys.iter().map(|key| self.namespace.key(key)).collect();

        let raw_values = match self.store.multi_get(&physical).await {
            Ok(values) => values,
            Err(e) => {
                error!(namespace = %self.namespace, "multi_get failed: {}", e);
                return keys.iter().map(|key| (key.clone(), None)).collect();
            }
        };

        // Match by physical key; the backend's ordering and completeness are
        // not trusted
        let raw_values: HashMap<String, Option<String>> = raw_values.into_iter().collect();

        let mut expired: Vec<String> = Vec::new();
        let mut results = Vec::with_capacity(keys.len());

        for (key, physical_key) in keys.iter().zip(physical) {
            let raw = raw_values.get(&physical_key).cloned().flatten();
            let value = raw.and_then(|raw| {
                let decoded = envelope::decode(&raw);
                if decoded.expired {
                    if !expired.contains(&physical_key) {
                        expired.push(physical_key);
                    }
                    None
                } else {
                    Some(decoded.value)
                }
            });
            results.push((key.clone(), value));
        }

        self.evict(&expired).await;
        results
    }

    async fn multi_set(&self, pairs: &[(String, String)], ttl: Option<u64>) -> Result<()> {
        let encoded = pairs
            .iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((
                    self.namespace.key(key),
                    envelope::encode(value, ttl, self.default_ttl)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.multi_set(&encoded).await.map_err(|e| {
            error!(namespace = %self.namespace, pairs = encoded.len(), "multi_set failed: {}", e);
            StorageError::backend("multi_set", None, e)
        })
    }
}
