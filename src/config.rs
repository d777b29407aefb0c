//! Configuration management for evc-storage
//!
//! This module handles loading and validating configuration from a TOML
//! file and `EVC_STORAGE_*` environment variables, layered over defaults.

use crate::error::{Result, StorageError};
use crate::factory::Platform;
use crate::storage::{AdapterConfig, Namespace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of every environment variable read by `Config::apply_env`
pub const ENV_PREFIX: &str = "EVC_STORAGE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub platform: Platform,
    pub namespace: String,
    /// TTL in seconds for writes that do not specify one
    pub default_ttl: Option<u64>,
    /// Backing file for the file-based browser store
    pub file_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Web,
            namespace: Namespace::DEFAULT.to_string(),
            default_ttl: None,
            file_path: PathBuf::from("evc-storage.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl FromStr for LogFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(StorageError::config_key(
                format!("unknown log format '{other}'"),
                "logging.format",
            )),
        }
    }
}

impl StorageConfig {
    /// Adapter settings carried by this section
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig::new(self.namespace.clone()).with_default_ttl(self.default_ttl)
    }
}

impl Config {
    /// Defaults, then the optional file, then the environment; validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file. Missing sections and keys take their
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| StorageError::config(format!("invalid configuration file: {e}")))
    }

    /// Override fields from `EVC_STORAGE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(platform) = env_var("PLATFORM") {
            self.storage.platform = platform.parse()?;
        }
        if let Some(namespace) = env_var("NAMESPACE") {
            self.storage.namespace = namespace;
        }
        if let Some(ttl) = env_var("DEFAULT_TTL") {
            self.storage.default_ttl = parse_ttl(&ttl)?;
        }
        if let Some(file) = env_var("FILE") {
            self.storage.file_path = PathBuf::from(file);
        }
        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.storage.adapter_config().validate()?;

        if self.storage.file_path.as_os_str().is_empty() {
            return Err(StorageError::config_key(
                "storage file path must not be empty",
                "storage.file_path",
            ));
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(StorageError::config_key(
                format!("invalid log level '{other}'"),
                "logging.level",
            )),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parse_ttl(value: &str) -> Result<Option<u64>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value.parse::<u64>().map(Some).map_err(|_| {
        StorageError::config_key(
            format!("invalid default TTL '{value}' (expected seconds or 'none')"),
            "storage.default_ttl",
        )
    })
}
