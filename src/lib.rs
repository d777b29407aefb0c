//! evc-storage - namespaced key/value storage with TTL expiry
//!
//! One async contract over two kinds of backing store: a synchronous
//! browser-style store and an asynchronous mobile-style store. Values are
//! wrapped in an envelope carrying a timestamp and optional TTL, and expire
//! lazily on read. An authentication façade stores tokens and user data on
//! top of whichever adapter the factory selects.

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Feature modules
pub mod auth;
pub mod cli;
pub mod factory;
pub mod storage;

// Public API exports
pub use auth::{AuthStorage, AUTH_TOKEN_KEY, AUTH_TTL_SECONDS, USER_DATA_KEY};
pub use config::Config;
pub use error::{Result, StorageError};
pub use factory::{create_adapter, create_auth_storage, Platform, StorageOptions};
pub use logging::LoggingSystem;

// Re-export commonly used types
pub use storage::{
    AdapterConfig, AdapterKind, AsyncKeyValueStore, BackendError, FileWebStorage,
    MemoryAsyncStore, MemoryWebStorage, MobileStorageAdapter, Namespace, StorageAdapter,
    StorageItem, WebStorage, WebStorageAdapter,
};

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
