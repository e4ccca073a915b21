//! Expiration scheduler daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin control lines ──▶ ExpiratorHandle ──▶ ┌──────────────────────────┐
//!                                               │   coordinator event loop │
//!   one-shot timers ─────▶ expiration channel ─▶│   registry + dirty flags │
//!                                               └───────┬──────────┬───────┘
//!                                                       │          │
//!                                                       ▼          ▼
//!                                              DirectoryStore   snapshot file
//!                                              (delete file)    (urgent/soft ticks)
//! ```
//!
//! Each expirable object is a file in `store.directory`; its identity is the
//! file name.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use expirator::config::{load_config, ExpiratorConfig};
use expirator::control::{self, ControlCommand};
use expirator::lifecycle::{signals, spawn_expirator, Shutdown};
use expirator::observability::{logging, metrics};
use expirator::store::DirectoryStore;

#[derive(Parser)]
#[command(name = "expiratord")]
#[command(
    about = "Deletes files from a directory when their time-to-live elapses",
    long_about = None
)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot file (overrides persistence.path).
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Directory of expirable files (overrides store.directory).
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Log level (overrides observability.log_level).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ExpiratorConfig::default(),
    };
    if let Some(snapshot) = cli.snapshot {
        config.persistence.path = Some(snapshot);
    }
    if let Some(directory) = cli.directory {
        config.store.directory = directory;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("expiratord v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        directory = %config.store.directory.display(),
        snapshot = ?config.persistence.path,
        channel_capacity = config.scheduler.channel_capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = Arc::new(DirectoryStore::new(config.store.directory.clone()));
    let shutdown = Shutdown::new();
    let running = spawn_expirator(config, store, &shutdown);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = signals::wait_for_signal() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match ControlCommand::parse(&line) {
                    Ok(command) => println!("{}", control::execute(&running.handle, command).await),
                    Err(e) => println!("error {e}"),
                },
                // stdin closed: keep serving timers until a signal arrives.
                Ok(None) => {
                    signals::wait_for_signal().await;
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read control input");
                    signals::wait_for_signal().await;
                    break;
                }
            },
        }
    }

    shutdown.trigger();
    running.task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
