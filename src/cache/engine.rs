//! Cache Engine Module
//!
//! The shared, thread-safe face of the cache. Owns the entry table behind an
//! async read-write lock together with the background expiration sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore};
use crate::config::Config;
use crate::tasks::spawn_sweep_task;

/// Capacity used when the caller asks for zero entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// How often the background sweep looks for expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// == Cache Engine ==
/// Size-bounded, time-aware key-value cache.
///
/// Every mutating operation (including `get`, which refreshes recency) takes
/// the write lock; `size` and `stats` take the read lock. Each call is one
/// atomic step with respect to the others.
///
/// The engine starts its sweep task on construction, so it must be created
/// inside a tokio runtime. Call [`CacheEngine::shutdown`] to stop the task;
/// dropping the engine also signals it.
#[derive(Debug)]
pub struct CacheEngine {
    store: Arc<RwLock<CacheStore>>,
    capacity: usize,
    shutdown_tx: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl CacheEngine {
    // == Constructors ==
    /// Creates an engine holding at most `capacity` entries.
    ///
    /// A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        Self::with_sweep_interval(capacity, DEFAULT_SWEEP_INTERVAL)
    }

    /// Creates an engine whose sweep runs every `sweep_interval`.
    pub fn with_sweep_interval(capacity: usize, sweep_interval: Duration) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        let sweep_interval = if sweep_interval.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            sweep_interval
        };

        let store = Arc::new(RwLock::new(CacheStore::new(capacity)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_sweep_task(store.clone(), sweep_interval, shutdown_rx);

        info!(capacity, "cache engine started");

        Self {
            store,
            capacity,
            shutdown_tx,
            sweeper: Mutex::new(Some(handle)),
        }
    }

    /// Creates an engine from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_sweep_interval(config.max_entries, config.sweep_interval())
    }

    // == Table Operations ==
    /// Stores `value` under `key`, clearing any previous expiration.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut store = self.store.write().await;
        store.set(key.into(), value.into());
    }

    /// Returns the value for `key` if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut store = self.store.write().await;
        store.get(key)
    }

    /// Removes `key`. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> bool {
        let mut store = self.store.write().await;
        store.delete(key)
    }

    /// Expires `key` in `ttl_seconds`. Returns false if the key is absent.
    pub async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        let mut store = self.store.write().await;
        store.expire(key, ttl_seconds)
    }

    /// Current number of entries, expired-but-unswept ones included.
    pub async fn size(&self) -> usize {
        self.store.read().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Snapshot Access ==
    /// Deep, point-in-time copy of every live entry.
    pub async fn export_data(&self) -> HashMap<String, CacheEntry> {
        self.store.read().await.export()
    }

    /// Atomically replaces the whole table with `data`.
    pub async fn import_data(&self, data: HashMap<String, CacheEntry>) {
        let count = data.len();
        self.store.write().await.import(data);
        debug!(count, "imported cache data");
    }

    // == Lifecycle ==
    /// Stops the background sweep and waits for it to finish.
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) {
        let Some(handle) = self.sweeper.lock().await.take() else {
            debug!("cache engine already shut down");
            return;
        };

        let _ = self.shutdown_tx.send(true);
        if let Err(e) = handle.await {
            warn!("expiration sweep ended abnormally: {}", e);
        }
        info!("cache engine shut down");
    }

    /// Whether shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for CacheEngine {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
