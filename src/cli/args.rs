//! CLI argument definitions using clap
//!
//! Commands:
//! - rowsplice inspect --change <path>
//! - rowsplice apply --project <path> --change <path> [--out <path>]
//! - rowsplice revert --project <path> --change <path> [--out <path>]
//!
//! Every command accepts `--config <path>`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rowsplice - apply and revert data-extension changes on tabular projects
#[derive(Parser, Debug)]
#[command(name = "rowsplice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a change record and print a summary
    Inspect {
        /// Path to configuration file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Change record to read
        #[arg(long)]
        change: PathBuf,
    },

    /// Apply a change record to a project
    Apply {
        /// Path to configuration file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Project JSON to modify
        #[arg(long)]
        project: PathBuf,

        /// Change record to apply
        #[arg(long)]
        change: PathBuf,

        /// Where to write the project (in place when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Revert an applied change record on a project
    Revert {
        /// Path to configuration file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Project JSON to modify
        #[arg(long)]
        project: PathBuf,

        /// Applied change record
        #[arg(long)]
        change: PathBuf,

        /// Where to write the project (in place when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
