//! Surge Daemon - Pricing service entry point
//!
//! Loads configuration and both pricing models, then serves the quote API
//! until SIGINT or SIGTERM.

#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::if_not_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::single_match_else)]

use anyhow::Result;
use surge_core::util::load_env_file;
use surge_daemon::{Config, SurgeDaemon};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from surge.env file first
    load_env_file();

    // Load configuration to get log settings
    let config = Config::load()?;

    let level = &config.daemon.log_level;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "surged={level},surge_daemon={level},surge_rl={level},surge_core={level},tower_http=debug"
        )
        .into()
    });

    let file_logging_enabled = if !config.daemon.log_file.is_empty() {
        let log_path = std::path::Path::new(&config.daemon.log_file);
        let log_dir = log_path.parent().unwrap_or(std::path::Path::new("."));
        let log_filename = log_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("surged.log");

        // Create the log directory and check that it is writable
        let can_write = (|| -> std::io::Result<()> {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir)?;
            }
            let test_path = log_dir.join(".write_test");
            std::fs::write(&test_path, "test")?;
            std::fs::remove_file(&test_path)?;
            Ok(())
        })();

        match can_write {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                    .init();

                // Guard must outlive every log call
                Box::leak(Box::new(guard));
                true
            }
            Err(e) => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                eprintln!(
                    "Warning: Could not set up file logging to '{}': {}. Using stdout only.",
                    config.daemon.log_file, e
                );
                false
            }
        }
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        false
    };

    info!("Starting Surge Daemon v{}", env!("CARGO_PKG_VERSION"));
    if file_logging_enabled {
        info!("Logging to file: {}", config.daemon.log_file);
    } else if !config.daemon.log_file.is_empty() {
        warn!("File logging was configured but could not be enabled");
    }
    info!(
        "Configuration loaded: bind_address={}, policy={:?}, demand={:?}, on_policy_load_failure={}",
        config.daemon.bind_address,
        config.models.policy_path,
        config.models.demand_path,
        config.models.on_policy_load_failure
    );

    // Model load failures stop the process before anything is served
    let daemon = match SurgeDaemon::new(config) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Failed to load pricing models: {}", e);
            if let Some(hint) = e.remediation() {
                error!("Hint: {}", hint);
            }
            std::process::exit(1);
        }
    };

    // A server that fails to bind or dies ends the process with an error
    if let Err(e) = daemon.run_until(shutdown_signal()).await {
        error!("Daemon error: {:#}", e);
        return Err(e);
    }

    info!("Surge Daemon stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}. Using fallback.", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}. Using Ctrl+C only.", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        () = terminate => {
            info!("Received SIGTERM");
        }
    }
}
