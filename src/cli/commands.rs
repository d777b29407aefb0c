//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and edit a file-backed evc storage namespace
#[derive(Parser, Debug)]
#[command(name = "evc-storage")]
#[command(about = "Namespaced key/value storage with TTL expiry")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "EVC_STORAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage file, overriding the configuration
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Namespace, overriding the configuration
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Store a value
    Set {
        key: String,
        value: String,
        /// Time to live in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Read a value
    Get { key: String },
    /// Delete a key
    Del { key: String },
    /// List keys in the namespace
    Keys,
    /// Delete every key in the namespace
    Clear,
    /// Evict expired items
    Cleanup,
    /// Store an authentication token
    Login { token: String },
    /// Remove the token and user data
    Logout,
    /// Report whether a token is stored
    Status,
    /// Store user data given as JSON
    SetUser { json: String },
    /// Show stored user data
    Whoami,
}
