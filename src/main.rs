//! Binary entry point for armiger.
//!
//! Parses the CLI, loads configuration and environment, initializes
//! logging, and dispatches to the command implementations in
//! [`armiger::cli`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use armiger::cli;
use armiger::config::ArmigerConfig;
use armiger::observability::{self, LoggingConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Armiger - a discussion-stream agent that spots weapon mentions and
/// replies with stat-grounded comparisons.
#[derive(Parser)]
#[command(name = "armiger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the agent.
    Run,

    /// Scan a piece of text against the catalog.
    Scan {
        /// The text to scan.
        text: String,
    },

    /// Fetch the catalog and print an index summary.
    Catalog,

    /// Show the persisted idempotency state.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; a present one supplies credentials.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    observability::init(&LoggingConfig {
        verbose: cli.verbose,
        json: cli.json_logs,
        filter: None,
    });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration and dispatches the selected command.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ArmigerConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ArmigerConfig::load_default(),
    }
    .with_env_overrides();

    match cli.command {
        Commands::Run => cli::cmd_run(config).await.context("running the agent")?,
        Commands::Scan { text } => cli::cmd_scan(config, &text).await.context("scanning text")?,
        Commands::Catalog => cli::cmd_catalog(config).await.context("building catalog")?,
        Commands::Status => cli::cmd_status(config).await.context("reading state")?,
    }

    Ok(())
}
