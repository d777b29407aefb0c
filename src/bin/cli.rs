//! evc-storage CLI binary
//!
//! Command-line interface over a file-backed storage namespace

use clap::Parser;
use evc_storage::cli::{resolve_config, run, Cli};
use evc_storage::LoggingSystem;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = LoggingSystem::new(config.logging.clone()).initialize() {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(&cli.command, &config).await {
        Ok(output) => {
            println!("{}", output.text);
            for warning in &output.warnings {
                eprintln!("warning: {warning}");
            }
            if output.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
