//! Integration tests for configuration management
//!
//! These tests load configuration from files and the environment and feed
//! it to the factory.

use evc_storage::config::LogFormat;
use evc_storage::{
    create_adapter, AdapterKind, Config, MemoryWebStorage, Platform, StorageError, StorageOptions,
};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// Config tests touch process-wide environment variables and must run serially
static GLOBAL_CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Remove all EVC_STORAGE_ variables, returning the originals
fn clean_evc_env() -> HashMap<String, String> {
    let original: HashMap<String, String> = env::vars()
        .filter(|(key, _)| key.starts_with("EVC_STORAGE_"))
        .collect();
    for key in original.keys() {
        env::remove_var(key);
    }
    original
}

fn restore_env(original: HashMap<String, String>) {
    for (key, _) in env::vars() {
        if key.starts_with("EVC_STORAGE_") {
            env::remove_var(&key);
        }
    }
    for (key, value) in original {
        env::set_var(key, value);
    }
}

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("evc-storage.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_from_file() {
    let _guard = GLOBAL_CONFIG_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let original_env = clean_evc_env();

    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[storage]
platform = "universal"
namespace = "admin"
default_ttl = 3600

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.storage.platform, Platform::Universal);
    assert_eq!(config.storage.namespace, "admin");
    assert_eq!(config.storage.default_ttl, Some(3600));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    restore_env(original_env);
}

#[test]
fn test_environment_overrides_file() {
    let _guard = GLOBAL_CONFIG_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let original_env = clean_evc_env();

    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[storage]
namespace = "admin"
default_ttl = 3600
"#,
    );

    env::set_var("EVC_STORAGE_NAMESPACE", "customer");
    env::set_var("EVC_STORAGE_DEFAULT_TTL", "none");
    env::set_var("EVC_STORAGE_PLATFORM", "mobile");

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.storage.namespace, "customer");
    assert_eq!(config.storage.default_ttl, None);
    assert_eq!(config.storage.platform, Platform::Mobile);

    restore_env(original_env);
}

#[test]
fn test_invalid_sources_are_config_errors() {
    let _guard = GLOBAL_CONFIG_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let original_env = clean_evc_env();

    let dir = TempDir::new().unwrap();
    let broken = write_config(&dir, "[storage\nnamespace = ");
    assert!(Config::load(Some(&broken)).unwrap_err().is_config_error());

    let bad_namespace = write_config(&dir, "[storage]\nnamespace = \"has space\"\n");
    assert!(Config::load(Some(&bad_namespace))
        .unwrap_err()
        .is_config_error());

    env::set_var("EVC_STORAGE_DEFAULT_TTL", "soon");
    let err = Config::load(None).unwrap_err();
    assert!(matches!(err, StorageError::Config { .. }));

    restore_env(original_env);
}

#[test]
fn test_missing_file_is_io_error() {
    let _guard = GLOBAL_CONFIG_TEST_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let original_env = clean_evc_env();

    let dir = TempDir::new().unwrap();
    let result = Config::load(Some(&dir.path().join("missing.toml")));
    assert!(matches!(result, Err(StorageError::Io(_))));

    restore_env(original_env);
}

#[tokio::test]
async fn test_config_drives_factory() {
    let config = Config::from_toml_str(
        r#"
[storage]
platform = "universal"
namespace = "shop"
"#,
    )
    .unwrap();

    let store = Arc::new(MemoryWebStorage::new());
    let adapter = create_adapter(
        StorageOptions::from_config(&config.storage).with_web_storage(store.clone()),
    )
    .unwrap();

    assert_eq!(adapter.kind(), AdapterKind::Web);
    assert_eq!(adapter.namespace().name(), "shop");

    adapter.set_item("cart", "3 items", None).await.unwrap();
    assert!(store.raw_get("shop_cart").is_some());
}
