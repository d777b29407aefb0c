//! Uniform adapter contract over heterogeneous backing stores
//!
//! Every operation is async. The browser adapter resolves without ever
//! suspending, the mobile adapter suspends on each backend call; callers see
//! one contract either way and never branch on return shape.

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callback notified whenever an adapter swallows a storage failure
pub type ErrorHook = Arc<dyn Fn(&StorageError) + Send + Sync>;

/// Which backend family an adapter wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Web,
    Mobile,
}

impl AdapterKind {
    /// Whether operations may suspend the caller
    pub fn is_async(&self) -> bool {
        matches!(self, AdapterKind::Mobile)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Web => "web",
            AdapterKind::Mobile => "mobile",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Namespace name; keys are stored as `"{namespace}_{key}"`.
    ///
    /// The name must be non-empty and may not contain whitespace or `_`, so
    /// a name such as `"my_app"` is rejected at construction with a
    /// configuration error. One trailing `_` is accepted and dropped, so
    /// `"evc_"` names the same namespace as `"evc"`. See [`Namespace`].
    pub namespace: String,
    /// TTL in seconds applied when a write does not specify one
    pub default_ttl: Option<u64>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            namespace: Namespace::DEFAULT.to_string(),
            default_ttl: None,
        }
    }
}

impl AdapterConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            default_ttl: None,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Option<u64>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Parse the namespace, rejecting names that could collide with another
    pub fn namespace(&self) -> Result<Namespace> {
        Namespace::parse(&self.namespace)
    }

    pub fn validate(&self) -> Result<()> {
        self.namespace().map(|_| ())
    }
}

/// Key prefix isolating one logical store inside a shared backend.
///
/// Physical keys are `"{name}_{logical}"`. Names may not contain `_`:
/// otherwise `"evc"` would own every key of a sibling `"evc_admin"`
/// namespace and `clear` on one would wipe the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    pub const DEFAULT: &'static str = "evc";
    const SEPARATOR: char = '_';

    /// Parse a namespace name. A single trailing separator is tolerated.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.strip_suffix(Self::SEPARATOR).unwrap_or(name);

        if name.is_empty() {
            return Err(StorageError::config_key(
                "namespace must not be empty",
                "storage.namespace",
            ));
        }
        if name.chars().any(|c| c.is_whitespace() || c == Self::SEPARATOR) {
            return Err(StorageError::config_key(
                format!("namespace '{name}' must not contain whitespace or '_'"),
                "storage.namespace",
            ));
        }

        Ok(Self {
            prefix: format!("{name}{}", Self::SEPARATOR),
        })
    }

    /// Namespace name without the separator
    pub fn name(&self) -> &str {
        &self.prefix[..self.prefix.len() - 1]
    }

    /// Prefix prepended to every logical key
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical key for a logical key
    pub fn key(&self, logical: &str) -> String {
        format!("{}{}", self.prefix, logical)
    }

    /// Logical key for a physical key, if it belongs to this namespace
    pub fn strip<'a>(&self, physical: &'a str) -> Option<&'a str> {
        physical.strip_prefix(self.prefix.as_str())
    }

    pub fn owns(&self, physical: &str) -> bool {
        physical.starts_with(self.prefix.as_str())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self {
            prefix: format!("{}{}", Self::DEFAULT, Self::SEPARATOR),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Namespaced key/value storage with lazy TTL expiry
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Backend family, fixed at construction
    fn kind(&self) -> AdapterKind;

    fn namespace(&self) -> &Namespace;

    /// Store `value` under `key`. `ttl` is in seconds and overrides the
    /// adapter default.
    async fn set_item(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<()>;

    /// Read `key`. Expired items are removed from the backing store and
    /// reported as absent; read failures are logged and reported as absent.
    async fn get_item(&self, key: &str) -> Option<String>;

    /// Delete `key`. Missing keys are not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Delete every key of this namespace and nothing else
    async fn clear(&self) -> Result<()>;

    /// Logical keys of this namespace
    async fn get_all_keys(&self) -> Vec<String>;

    /// Read every key so that expired ones are evicted.
    ///
    /// Returns how many keys disappeared during the pass.
    async fn cleanup_expired(&self) -> usize {
        let keys = self.get_all_keys().await;
        let before = keys.len();

        for key in &keys {
            self.get_item(key).await;
        }

        let evicted = before.saturating_sub(self.get_all_keys().await.len());
        if evicted > 0 {
            tracing::debug!(
                namespace = %self.namespace(),
                evicted,
                "cleanup removed expired items"
            );
        }
        evicted
    }

    /// Read several keys; one result per requested key, in order
    async fn multi_get(&self, keys: &[String]) -> Vec<(String, Option<String>)> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push((key.clone(), self.get_item(key).await));
        }
        results
    }

    /// Write several pairs with the same TTL. Not atomic: pairs written
    /// before a failure stay written.
    async fn multi_set(&self, pairs: &[(String, String)], ttl: Option<u64>) -> Result<()> {
        for (key, value) in pairs {
            self.set_item(key, value, ttl).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        let ns = Namespace::default();
        assert_eq!(ns.name(), "evc");
        assert_eq!(ns.prefix(), "evc_");
        assert_eq!(ns.key("authToken"), "evc_authToken");
        assert_eq!(AdapterConfig::default().namespace().unwrap(), ns);
    }

    #[test]
    fn test_namespace_strip_and_owns() {
        let ns = Namespace::parse("test").unwrap();
        assert_eq!(ns.strip("test_k1"), Some("k1"));
        assert_eq!(ns.strip("other_k1"), None);
        assert_eq!(ns.strip("testk1"), None);
        assert!(ns.owns("test_"));
        assert!(!ns.owns("tes_x"));
    }

    #[test]
    fn test_namespace_trailing_separator_tolerated() {
        let ns = Namespace::parse("evc_").unwrap();
        assert_eq!(ns.prefix(), "evc_");
        assert_eq!(ns.to_string(), "evc");
    }

    #[test]
    fn test_namespace_rejects_invalid_names() {
        for name in ["", "_", "my app", "evc_admin", "a__"] {
            let err = Namespace::parse(name).unwrap_err();
            assert!(err.is_config_error(), "expected config error for {name:?}");
        }
    }

    #[test]
    fn test_adapter_config_builder() {
        let config = AdapterConfig::new("admin").with_default_ttl(Some(30));
        assert_eq!(config.namespace, "admin");
        assert_eq!(config.default_ttl, Some(30));
        assert!(config.validate().is_ok());
        assert!(AdapterConfig::new(" ").validate().is_err());

        let err = AdapterConfig::new("my_app").validate().unwrap_err();
        assert!(err.to_string().contains("must not contain whitespace or '_'"));
        assert_eq!(
            AdapterConfig::new("evc_").namespace().unwrap(),
            Namespace::default()
        );
    }

    #[test]
    fn test_adapter_kind() {
        assert!(AdapterKind::Mobile.is_async());
        assert!(!AdapterKind::Web.is_async());
        assert_eq!(AdapterKind::Web.to_string(), "web");
    }
}
