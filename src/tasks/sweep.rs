//! Expiration Sweep Task
//!
//! Background task that periodically removes expired cache entries, so keys
//! nobody reads still disappear within one interval of their expiration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns the background sweep task.
///
/// The task wakes every `interval`, takes the store's write lock and purges
/// expired entries. It exits as soon as `shutdown` flips to `true` (or its
/// sender is dropped), including while it is waiting for the lock.
///
/// # Returns
/// The JoinHandle of the task; the owner awaits it to complete shutdown.
pub fn spawn_sweep_task(
    store: Arc<RwLock<CacheStore>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "expiration sweep started");

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let removed = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                mut guard = store.write() => guard.purge_expired(),
            };

            if removed > 0 {
                info!("expiration sweep: removed {} expired entries", removed);
            } else {
                debug!("expiration sweep: no expired entries found");
            }
        }

        info!("expiration sweep stopped");
    })
}
