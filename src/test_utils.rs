//! Test utilities for evc-storage
//!
//! Helpers for tests that touch `EVC_STORAGE_*` environment variables, so
//! they do not pollute each other.

use crate::config::ENV_PREFIX;
use std::collections::HashMap;
use std::env;
use std::sync::Mutex;

/// Global mutex to ensure all env-dependent config tests run serially
pub static GLOBAL_CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Remove every `EVC_STORAGE_*` variable and return the original values
pub fn clean_evc_env() -> HashMap<String, String> {
    let original_values: HashMap<String, String> = env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect();

    for key in original_values.keys() {
        env::remove_var(key);
    }

    original_values
}

/// Drop any `EVC_STORAGE_*` variable set by a test and restore the originals
pub fn restore_env(original_values: HashMap<String, String>) {
    for (key, _) in env::vars() {
        if key.starts_with(ENV_PREFIX) {
            env::remove_var(&key);
        }
    }

    for (key, value) in original_values {
        env::set_var(key, value);
    }
}
