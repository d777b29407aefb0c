//! In-memory backing stores
//!
//! `MemoryWebStorage` behaves like browser local storage (synchronous,
//! ordered keys, optional byte quota). `MemoryAsyncStore` behaves like a
//! mobile async store and is backed by a `DashMap`. Both can be told to fail
//! so degraded-backend paths can be exercised.

use super::backend::{AsyncKeyValueStore, BackendError, BackendResult, WebStorage};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Synchronous in-memory store with browser local-storage semantics
#[derive(Debug)]
pub struct MemoryWebStorage {
    data: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
    available: AtomicBool,
}

impl MemoryWebStorage {
    /// Create an empty, unbounded store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            quota_bytes: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create a store that rejects writes once keys plus values exceed
    /// `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Toggle availability; an unavailable store fails every call
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a physical key directly, bypassing availability checks
    pub fn raw_get(&self, key: &str) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Write a physical key directly, bypassing quota and envelopes
    pub fn raw_insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// All physical keys, in order
    pub fn keys(&self) -> Vec<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn usage_with(data: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
        let current: usize = data
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        current + key.len() + value.len()
    }
}

impl Default for MemoryWebStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl WebStorage for MemoryWebStorage {
    fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.raw_get(key))
    }

    fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        self.ensure_available()?;
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(quota) = self.quota_bytes {
            if Self::usage_with(&data, key, value) > quota {
                return Err(BackendError::QuotaExceeded);
            }
        }

        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> BackendResult<()> {
        self.ensure_available()?;
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn key(&self, index: usize) -> BackendResult<Option<String>> {
        self.ensure_available()?;
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .nth(index)
            .cloned())
    }

    fn length(&self) -> BackendResult<usize> {
        self.ensure_available()?;
        Ok(self.len())
    }

    fn all_keys(&self) -> BackendResult<Vec<String>> {
        self.ensure_available()?;
        Ok(self.keys())
    }
}

/// Asynchronous in-memory store with mobile async-store semantics
#[derive(Debug, Default)]
pub struct MemoryAsyncStore {
    data: DashMap<String, String>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryAsyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with an I/O error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write (including removals) fail with an I/O error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn raw_get(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    pub fn raw_insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    fn check_read(&self) -> BackendResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Io("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> BackendResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Io("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncKeyValueStore for MemoryAsyncStore {
    async fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        self.check_read()?;
        Ok(self.raw_get(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        self.check_write()?;
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> BackendResult<()> {
        self.check_write()?;
        self.data.remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> BackendResult<Vec<String>> {
        self.check_read()?;
        let mut keys: Vec<String> = self.data.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn multi_get(&self, keys: &[String]) -> BackendResult<Vec<(String, Option<String>)>> {
        self.check_read()?;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), self.raw_get(key)))
            .collect())
    }

    async fn multi_set(&self, pairs: &[(String, String)]) -> BackendResult<()> {
        self.check_write()?;
        for (key, value) in pairs {
            self.data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> BackendResult<()> {
        self.check_write()?;
        for key in keys {
            self.data.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_storage_basic_operations() {
        let store = MemoryWebStorage::new();
        assert!(store.is_empty());

        store.set_item("b", "2").unwrap();
        store.set_item("a", "1").unwrap();
        assert_eq!(store.get_item("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.length().unwrap(), 2);

        // Keys enumerate in order
        assert_eq!(store.key(0).unwrap(), Some("a".to_string()));
        assert_eq!(store.key(1).unwrap(), Some("b".to_string()));
        assert_eq!(store.key(2).unwrap(), None);

        store.remove_item("a").unwrap();
        store.remove_item("missing").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_web_storage_quota() {
        let store = MemoryWebStorage::with_quota(10);
        store.set_item("k", "12345").unwrap();
        assert_eq!(
            store.set_item("k2", "123456789"),
            Err(BackendError::QuotaExceeded)
        );
        // Replacing an existing key only counts the new value
        store.set_item("k", "123456789").unwrap();
        assert_eq!(store.raw_get("k2"), None);
    }

    #[test]
    fn test_web_storage_unavailable() {
        let store = MemoryWebStorage::new();
        store.raw_insert("k", "v");
        store.set_available(false);

        assert_eq!(store.get_item("k"), Err(BackendError::Unavailable));
        assert_eq!(store.set_item("k", "v2"), Err(BackendError::Unavailable));
        assert_eq!(store.length(), Err(BackendError::Unavailable));
        assert!(!store.is_available());

        store.set_available(true);
        assert!(store.is_available());
        // The availability probe leaves nothing behind
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_async_store_operations() {
        let store = MemoryAsyncStore::new();
        store.set_item("b", "2").await.unwrap();
        store
            .multi_set(&[("a".to_string(), "1".to_string()), ("c".to_string(), "3".to_string())])
            .await
            .unwrap();

        assert_eq!(store.get_all_keys().await.unwrap(), vec!["a", "b", "c"]);

        let values = store
            .multi_get(&["c".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![
                ("c".to_string(), Some("3".to_string())),
                ("missing".to_string(), None)
            ]
        );

        store
            .multi_remove(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_async_store_failure_injection() {
        let store = MemoryAsyncStore::new();
        store.raw_insert("k", "v");

        store.fail_writes(true);
        assert!(matches!(
            store.set_item("k", "v2").await,
            Err(BackendError::Io(_))
        ));
        assert!(store.remove_item("k").await.is_err());
        assert_eq!(store.get_item("k").await.unwrap(), Some("v".to_string()));

        store.fail_writes(false);
        store.fail_reads(true);
        assert!(store.get_item("k").await.is_err());
        assert!(store.get_all_keys().await.is_err());
    }
}
