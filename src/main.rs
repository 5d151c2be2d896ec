//! Cache Engine - interactive shell
//!
//! Starts a cache engine and reads commands from stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_engine::cli::{self, Session};
use cache_engine::config::{normalize_capacity, Config};
use cache_engine::CacheEngine;

/// In-process key-value cache with LRU eviction and TTL expiration.
#[derive(Parser, Debug)]
#[command(name = "cache_engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of entries (non-positive uses the default of 1000)
    #[arg(long, allow_negative_numbers = true)]
    max: Option<i64>,

    /// Expiration sweep interval in seconds
    #[arg(long)]
    cleanup_interval: Option<u64>,

    /// Operation log used by SAVE, LOAD and ENABLELOG
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Snapshot file used by SNAPSHOT and RESTORE
    #[arg(long)]
    snapshot_file: Option<PathBuf>,

    /// Log every mutation to the operation log from startup
    #[arg(long)]
    auto_log: bool,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(max) = self.max {
            config.max_entries = normalize_capacity(max);
        }
        if let Some(secs) = self.cleanup_interval.filter(|secs| *secs > 0) {
            config.cleanup_interval = secs;
        }
        if let Some(path) = self.log_file {
            config.log_file = path;
        }
        if let Some(path) = self.snapshot_file {
            config.snapshot_file = path;
        }
        config.auto_log |= self.auto_log;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the shell output stays readable.
    // Defaults to "warn", can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Args::parse().apply(Config::from_env());
    info!(
        "Configuration loaded: max_entries={}, cleanup_interval={}s, log_file={}, snapshot_file={}",
        config.max_entries,
        config.cleanup_interval,
        config.log_file.display(),
        config.snapshot_file.display()
    );

    let engine = Arc::new(CacheEngine::from_config(&config));
    let mut session = Session::new(engine.clone(), &config);

    let interrupted = tokio::select! {
        result = cli::run(&mut session, BufReader::new(stdin()), stdout()) => {
            result.context("shell I/O failed")?;
            false
        }
        _ = shutdown_signal() => true,
    };

    engine.shutdown().await;

    if interrupted {
        // The runtime cannot cancel a pending blocking stdin read, so dropping
        // it would wait for the next line of input.
        std::process::exit(0);
    }
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
