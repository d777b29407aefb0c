//! Structured logging setup
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and a formatter
//! chosen by configuration. Output goes to stderr so command output on
//! stdout stays clean.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, StorageError};
use tracing::{debug, warn, Level};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Logging system manager
#[derive(Debug, Clone)]
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl LoggingSystem {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Install the global subscriber. A subscriber that is already installed
    /// is left in place and only reported.
    pub fn initialize(&self) -> Result<()> {
        let level = parse_log_level(&self.config.level)?;

        // RUST_LOG directives win over the configured level
        let env_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .from_env_lossy();

        let installed = match self.config.format {
            LogFormat::Json => Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_current_span(false)
                        .with_target(true),
                )
                .try_init(),
            LogFormat::Pretty => Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false),
                )
                .try_init(),
            LogFormat::Compact => Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_target(false),
                )
                .try_init(),
        };

        match installed {
            Ok(()) => debug!(
                "Logging initialized at level {} ({:?})",
                level, self.config.format
            ),
            Err(e) => warn!(
                "Failed to initialize tracing subscriber (may already be set): {}",
                e
            ),
        }
        Ok(())
    }
}

/// Parse a level name into a tracing `Level`
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(StorageError::config_key(
            format!("Invalid log level: {level}"),
            "logging.level",
        )),
    }
}
