//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;

/// Default append-only operation log.
pub const DEFAULT_LOG_FILE: &str = "cache.log";

/// Default whole-table snapshot file.
pub const DEFAULT_SNAPSHOT_FILE: &str = "cache_snapshot.json";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Expiration sweep interval in seconds
    pub cleanup_interval: u64,
    /// Operation log used by SAVE / LOAD / ENABLELOG
    pub log_file: PathBuf,
    /// Snapshot file used by SNAPSHOT / RESTORE
    pub snapshot_file: PathBuf,
    /// Append every mutation to `log_file` from startup
    pub auto_log: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000, non-positive values use the default)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `LOG_FILE` - Operation log path (default: cache.log)
    /// - `SNAPSHOT_FILE` - Snapshot path (default: cache_snapshot.json)
    /// - `AUTO_LOG` - `true`/`1` to log every mutation (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(normalize_capacity)
                .unwrap_or(defaults.max_entries),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
            log_file: env::var("LOG_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            snapshot_file: env::var("SNAPSHOT_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_file),
            auto_log: env::var("AUTO_LOG")
                .ok()
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.auto_log),
        }
    }

    /// Sweep interval as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }
}

/// Maps a requested capacity to a usable one: non-positive means default.
pub fn normalize_capacity(requested: i64) -> usize {
    if requested <= 0 {
        DEFAULT_CAPACITY
    } else {
        usize::try_from(requested).unwrap_or(DEFAULT_CAPACITY)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CAPACITY,
            cleanup_interval: 1,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            snapshot_file: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            auto_log: false,
        }
    }
}
