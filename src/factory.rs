//! Adapter construction
//!
//! The single place where platform branching happens. Backing stores are
//! always supplied by the caller, so a web build never links a mobile store
//! and vice versa.

use crate::auth::AuthStorage;
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::storage::{
    AdapterConfig, AsyncKeyValueStore, ErrorHook, MobileStorageAdapter, StorageAdapter,
    WebStorage, WebStorageAdapter,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Target platform for adapter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Mobile,
    /// Use browser storage when it is reachable, otherwise the async store
    Universal,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Mobile => "mobile",
            Platform::Universal => "universal",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "mobile" => Ok(Platform::Mobile),
            "universal" => Ok(Platform::Universal),
            other => Err(StorageError::config_key(
                format!("unknown platform '{other}' (expected web, mobile or universal)"),
                "storage.platform",
            )),
        }
    }
}

/// Everything needed to build an adapter
#[derive(Clone, Default)]
pub struct StorageOptions {
    pub platform: Platform,
    pub config: AdapterConfig,
    pub web_storage: Option<Arc<dyn WebStorage>>,
    pub async_store: Option<Arc<dyn AsyncKeyValueStore>>,
    pub error_hook: Option<ErrorHook>,
}

impl StorageOptions {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Options for the platform, namespace and default TTL of a config
    /// section. Backing stores still have to be attached.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            platform: config.platform,
            config: config.adapter_config(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Option<u64>) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn with_web_storage(mut self, store: Arc<dyn WebStorage>) -> Self {
        self.web_storage = Some(store);
        self
    }

    pub fn with_async_store(mut self, store: Arc<dyn AsyncKeyValueStore>) -> Self {
        self.async_store = Some(store);
        self
    }

    /// Hook notified of failures the browser adapter swallows
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }
}

impl fmt::Debug for StorageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .field("web_storage", &self.web_storage.is_some())
            .field("async_store", &self.async_store.is_some())
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

/// Build the adapter matching `options.platform`.
///
/// Fails with a configuration error when the mobile platform has no async
/// store, or when universal detection finds no usable backend.
pub fn create_adapter(options: StorageOptions) -> Result<Arc<dyn StorageAdapter>> {
    let StorageOptions {
        platform,
        config,
        web_storage,
        async_store,
        error_hook,
    } = options;

    let adapter = match platform {
        Platform::Web => build_web(web_storage, config, error_hook)?,
        Platform::Mobile => {
            let store = async_store.ok_or_else(|| {
                StorageError::config_key(
                    "mobile platform requires an async key/value store",
                    "async_store",
                )
            })?;
            build_mobile(store, config)?
        }
        Platform::Universal => {
            if let Some(store) = web_storage.filter(|store| store.is_available()) {
                debug!("universal platform: browser storage reachable");
                build_web(Some(store), config, error_hook)?
            } else if let Some(store) = async_store {
                debug!("universal platform: falling back to async store");
                build_mobile(store, config)?
            } else {
                return Err(StorageError::config(
                    "no suitable storage backend: browser storage is unreachable and no async store was supplied",
                ));
            }
        }
    };

    info!(
        platform = %platform,
        adapter = %adapter.kind(),
        namespace = %adapter.namespace(),
        "storage adapter created"
    );
    Ok(adapter)
}

/// Build an adapter and wrap it in the auth façade
pub fn create_auth_storage(options: StorageOptions) -> Result<AuthStorage> {
    Ok(AuthStorage::new(create_adapter(options)?))
}

fn build_web(
    store: Option<Arc<dyn WebStorage>>,
    config: AdapterConfig,
    error_hook: Option<ErrorHook>,
) -> Result<Arc<dyn StorageAdapter>> {
    let mut adapter = match store {
        Some(store) => WebStorageAdapter::new(store, config)?,
        None => WebStorageAdapter::detached(config)?,
    };
    if let Some(hook) = error_hook {
        adapter = adapter.with_error_hook(hook);
    }
    Ok(Arc::new(adapter))
}

fn build_mobile(
    store: Arc<dyn AsyncKeyValueStore>,
    config: AdapterConfig,
) -> Result<Arc<dyn StorageAdapter>> {
    Ok(Arc::new(MobileStorageAdapter::new(store, config)?))
}
