//! CLI module for rowsplice
//!
//! Provides command-line interface for:
//! - inspect: Decode and summarize a change record
//! - apply: Apply a change record to a project file
//! - revert: Revert an applied change record

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, inspect, revert, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{applied_path, read_change, read_project, write_change, write_project, write_response};
