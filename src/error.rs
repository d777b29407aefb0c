//! Error types and handling for evc-storage
//!
//! This module defines the error taxonomy used throughout the crate.
//! Backend availability problems are recovered inside the adapters; the
//! errors that reach application code are configuration mistakes and the
//! write failures a mobile backend propagates.

use crate::storage::backend::BackendError;
use thiserror::Error;

/// Main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        config_key: Option<String>,
    },

    #[error("Backend error during {operation}: {source}")]
    Backend {
        operation: &'static str,
        key: Option<String>,
        #[source]
        source: BackendError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Build a configuration error without an associated config key
    pub fn config(message: impl Into<String>) -> Self {
        StorageError::Config {
            message: message.into(),
            config_key: None,
        }
    }

    /// Build a configuration error pointing at a specific config key
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        StorageError::Config {
            message: message.into(),
            config_key: Some(key.into()),
        }
    }

    /// Wrap a backend failure with the operation and logical key it hit
    pub fn backend(operation: &'static str, key: Option<&str>, source: BackendError) -> Self {
        StorageError::Backend {
            operation,
            key: key.map(str::to_string),
            source,
        }
    }

    /// Wiring mistakes that callers are expected to handle at construction time
    pub fn is_config_error(&self) -> bool {
        matches!(self, StorageError::Config { .. })
    }

    /// Environment conditions (store missing or full) rather than faults.
    /// These are logged as warnings instead of errors.
    pub fn is_soft_failure(&self) -> bool {
        matches!(
            self,
            StorageError::Backend {
                source: BackendError::Unavailable | BackendError::QuotaExceeded,
                ..
            }
        )
    }
}
