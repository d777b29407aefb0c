//! Storage layer implementations
//!
//! This module provides the stored-item envelope, the backing-store
//! interfaces, concrete stores, and the two adapters that put a uniform
//! namespaced, TTL-aware contract on top of them.

pub mod adapter;
pub mod backend;
pub mod envelope;
pub mod file;
pub mod memory;
pub mod mobile;
pub mod web;

pub use adapter::{AdapterConfig, AdapterKind, ErrorHook, Namespace, StorageAdapter};
pub use backend::{AsyncKeyValueStore, BackendError, BackendResult, WebStorage};
pub use envelope::{Decoded, StorageItem};
pub use file::FileWebStorage;
pub use memory::{MemoryAsyncStore, MemoryWebStorage};
pub use mobile::MobileStorageAdapter;
pub use web::WebStorageAdapter;
