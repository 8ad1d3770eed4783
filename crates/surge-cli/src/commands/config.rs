//! Configuration management commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;

const CONFIG_FILE: &str = "surge.toml";
const DEFAULT_CONFIG: &str = include_str!("../../../../surge.toml.example");

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(),
        ConfigCommands::Init { force } => init(Path::new(CONFIG_FILE), force),
    }
}

/// Same search order as the daemon
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        std::env::var("SURGE_CONFIG").ok().map(PathBuf::from),
        Some(PathBuf::from(CONFIG_FILE)),
        dirs::home_dir().map(|h| h.join(".config/surge/surge.toml")),
    ];

    candidates.into_iter().flatten().find(|p| p.exists())
}

fn show() -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    if let Some(path) = find_config_file() {
        println!("Config file: {}\n", path.display());
        let content = std::fs::read_to_string(&path)?;
        // Surface syntax errors here rather than at daemon startup
        if let Err(e) = toml::from_str::<toml::Table>(&content) {
            println!("Warning: config file does not parse: {e}\n");
        }
        println!("{content}");
        return Ok(());
    }

    println!("No configuration file found. Using defaults.");
    println!("\nDefault values:");
    println!("  daemon.bind_address = 127.0.0.1:9300");
    println!("  models.policy_path = models/surge_policy.json");
    println!("  models.demand_path = models/demand_model.json");
    println!("  models.on_policy_load_failure = halt");
    println!("  pricing.fare_mode = distance");
    println!("  pricing.rate_per_km = 1.5");

    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Configuration file created: {}", path.display());

    Ok(())
}
