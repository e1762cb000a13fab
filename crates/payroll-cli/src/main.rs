//! CLI entry point for the payroll assistant.
//!
//! This binary provides the `payroll` command with subcommands for running an
//! interactive session, extracting a single document, and checking the
//! configuration.

mod cli;
mod commands;
mod helpers;
mod repl;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            existing,
            document,
            config,
        } => repl::cmd_chat(existing, document, config).await,
        Commands::Extract {
            file,
            media_type,
            existing,
            config,
        } => commands::cmd_extract(file, media_type, existing, config).await,
        Commands::Status { config } => commands::cmd_status(config),
    }
}
