//! Command execution for the CLI
//!
//! Commands run against a file-backed browser-style store built through the
//! factory. Execution returns the text to print so it can be tested without
//! spawning the binary.

use super::commands::{Cli, Commands};
use crate::auth::AuthStorage;
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::factory::{create_auth_storage, Platform, StorageOptions};
use crate::storage::FileWebStorage;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Output of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOutput {
    pub text: String,
    /// Storage failures swallowed during the command
    pub warnings: Vec<String>,
}

impl CliOutput {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Load configuration and apply command-line overrides
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(file) = &cli.file {
        config.storage.file_path = file.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.storage.namespace = namespace.clone();
    }

    config.validate()?;
    ensure_file_backed(&config)?;
    Ok(config)
}

/// The CLI only has a file store to offer, which the mobile platform cannot
/// use
fn ensure_file_backed(config: &Config) -> Result<()> {
    match config.storage.platform {
        Platform::Web | Platform::Universal => Ok(()),
        Platform::Mobile => Err(StorageError::config_key(
            "the CLI is file-backed and cannot use the mobile platform (use web or universal)",
            "storage.platform",
        )),
    }
}

/// Open the configured store and run `command` against it
pub async fn run(command: &Commands, config: &Config) -> Result<CliOutput> {
    ensure_file_backed(config)?;

    let warnings = Arc::new(Mutex::new(Vec::new()));
    let sink = warnings.clone();

    let store = Arc::new(FileWebStorage::open(&config.storage.file_path)?);
    let options = StorageOptions::from_config(&config.storage)
        .with_web_storage(store)
        .with_error_hook(Arc::new(move |err: &StorageError| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(err.to_string());
        }));
    let auth = create_auth_storage(options)?;

    debug!(?command, file = ?config.storage.file_path, "executing command");
    let text = execute(command, &auth).await?;

    let warnings = std::mem::take(&mut *warnings.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(CliOutput { text, warnings })
}

async fn execute(command: &Commands, auth: &AuthStorage) -> Result<String> {
    let adapter = auth.adapter();

    let text = match command {
        Commands::Set { key, value, ttl } => {
            adapter.set_item(key, value, *ttl).await?;
            "OK".to_string()
        }
        Commands::Get { key } => adapter
            .get_item(key)
            .await
            .unwrap_or_else(|| "(nil)".to_string()),
        Commands::Del { key } => {
            adapter.remove_item(key).await?;
            "OK".to_string()
        }
        Commands::Keys => {
            let mut keys = adapter.get_all_keys().await;
            if keys.is_empty() {
                "(empty)".to_string()
            } else {
                keys.sort();
                keys.join("\n")
            }
        }
        Commands::Clear => {
            adapter.clear().await?;
            "OK".to_string()
        }
        Commands::Cleanup => {
            let evicted = adapter.cleanup_expired().await;
            format!("evicted {evicted} expired item(s)")
        }
        Commands::Login { token } => {
            auth.set_token(token).await?;
            "OK".to_string()
        }
        Commands::Logout => {
            auth.remove_token().await?;
            auth.remove_user_data().await?;
            "OK".to_string()
        }
        Commands::Status => {
            if auth.is_authenticated().await {
                "authenticated".to_string()
            } else {
                "not authenticated".to_string()
            }
        }
        Commands::SetUser { json } => {
            let value: serde_json::Value = serde_json::from_str(json)?;
            auth.set_user_data(&value).await?;
            "OK".to_string()
        }
        Commands::Whoami => match auth.get_user_data::<serde_json::Value>().await {
            Some(user) => serde_json::to_string_pretty(&user)?,
            None => "(anonymous)".to_string(),
        },
    };

    Ok(text)
}

/// Convenience for callers holding only a path
pub async fn run_with_file(command: &Commands, file: &Path) -> Result<CliOutput> {
    let mut config = Config::default();
    config.storage.file_path = file.to_path_buf();
    run(command, &config).await
}
