//! CLI argument definitions for the payroll assistant.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Payroll assistant -- extract, review and report employee pay data.
#[derive(Parser)]
#[command(
    name = "payroll",
    version,
    about = "Payroll assistant -- extract, review and report employee pay data",
    long_about = "Upload a timesheet or pay document, correct the extracted employee data \
                  in conversation, and generate a payroll report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive payroll session.
    Chat {
        /// JSON file with the previous period's employees.
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Document to upload before the first prompt.
        #[arg(long)]
        document: Option<PathBuf>,

        /// Configuration file (TOML or JSON).
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Extract employees from one document and print them as JSON.
    Extract {
        /// The document to read.
        file: PathBuf,

        /// Media type, if the file extension is not enough.
        #[arg(long)]
        media_type: Option<String>,

        /// JSON file with known employees to merge into.
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Configuration file (TOML or JSON).
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Show the effective configuration.
    Status {
        /// Configuration file (TOML or JSON).
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}
