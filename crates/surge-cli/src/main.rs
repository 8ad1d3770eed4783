//! Surge CLI - Command line interface for the surge pricing service
//!
//! Requests quotes from a running `surged` and manages policy table
//! snapshots locally.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_precision_loss)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use surge_core::util::load_env_file;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{config, policy, quote, status};

#[derive(Parser)]
#[command(name = "surge")]
#[command(author, version, about = "Surge - ride-hailing surge pricing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a fare quote from the daemon
    Quote(quote::QuoteArgs),

    /// Show daemon status
    Status,

    /// Manage policy table snapshots
    #[command(subcommand)]
    Policy(policy::PolicyCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from surge.env file (before parsing args)
    load_env_file();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Quote(args) => quote::run(args).await,
        Commands::Status => status::run().await,
        Commands::Policy(cmd) => policy::run(cmd).await,
        Commands::Config(cmd) => config::run(cmd).await,
    }
}

/// Log filter used when `RUST_LOG` is unset; targets follow the crate names,
/// and the binary crate is `surge`
fn default_log_filter(verbose: bool) -> String {
    let log_level = if verbose { "debug" } else { "info" };
    format!("surge={log_level},surge_rl={log_level},surge_core={log_level}")
}
