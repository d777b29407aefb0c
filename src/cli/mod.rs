//! Command Line Interface for evc-storage
//!
//! A small front end over a file-backed store, for inspecting and editing
//! a namespace outside the application that owns it.

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::{resolve_config, run, run_with_file, CliOutput};
