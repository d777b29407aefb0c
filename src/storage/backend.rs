//! Backing-store collaborator interfaces
//!
//! The adapters never construct a platform store themselves. Callers inject
//! one of the two store families defined here: a synchronous browser-style
//! store, or an asynchronous mobile-style store with batch primitives.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a backing store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("storage backend is unavailable")]
    Unavailable,

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// Result type returned by backing stores
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Key reserved for availability probes; never inside a valid namespace
const PROBE_KEY: &str = "__evc_storage_probe__";

/// Synchronous persistent key/value store, shaped like browser local storage
pub trait WebStorage: Send + Sync {
    /// Read the raw value stored under `key`
    fn get_item(&self, key: &str) -> BackendResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove_item(&self, key: &str) -> BackendResult<()>;

    /// Name of the key at position `index`, if any
    fn key(&self, index: usize) -> BackendResult<Option<String>>;

    /// Number of keys currently stored
    fn length(&self) -> BackendResult<usize>;

    /// Snapshot of every stored key.
    ///
    /// The default walks `key(0..length)`, which costs one lookup per index.
    /// Stores that can list their keys in one pass should override it.
    fn all_keys(&self) -> BackendResult<Vec<String>> {
        let length = self.length()?;
        let mut keys = Vec::with_capacity(length);
        for index in 0..length {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Whether the store accepts writes right now.
    ///
    /// The default implementation writes and removes a reserved probe key,
    /// which is how a disabled or read-only browser store is detected.
    fn is_available(&self) -> bool {
        self.set_item(PROBE_KEY, PROBE_KEY)
            .and_then(|()| self.remove_item(PROBE_KEY))
            .is_ok()
    }
}

/// Asynchronous key/value primitive, shaped like a mobile async store
///
/// Batch operations are not required to be atomic. `multi_get` must return
/// one entry per requested key, in request order.
#[async_trait]
pub trait AsyncKeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> BackendResult<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> BackendResult<()>;

    async fn remove_item(&self, key: &str) -> BackendResult<()>;

    async fn get_all_keys(&self) -> BackendResult<Vec<String>>;

    async fn multi_get(&self, keys: &[String]) -> BackendResult<Vec<(String, Option<String>)>>;

    async fn multi_set(&self, pairs: &[(String, String)]) -> BackendResult<()>;

    async fn multi_remove(&self, keys: &[String]) -> BackendResult<()>;
}
