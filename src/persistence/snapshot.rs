//! Snapshot Files
//!
//! Whole-table persistence: one pretty-printed JSON object mapping each key
//! to its entry, written and read back in full.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cache::{ceil_seconds, current_timestamp_ms, CacheEngine, CacheEntry};
use crate::error::{CacheError, Result};

/// Writes every live entry of `engine` to `path`, replacing the file.
///
/// Returns the number of entries written.
pub async fn save_snapshot(engine: &CacheEngine, path: &Path) -> Result<usize> {
    let data: BTreeMap<String, CacheEntry> = engine.export_data().await.into_iter().collect();

    let json = serde_json::to_string_pretty(&data).map_err(|source| CacheError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| CacheError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CacheError::io(path, e))?;

    info!(count = data.len(), path = %path.display(), "wrote snapshot");
    Ok(data.len())
}

/// Sibling file the snapshot is written to before being renamed into place.
fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Loads the snapshot at `path` into `engine` via `set` and `expire`.
///
/// Entries are applied oldest access first so the engine's recency order
/// matches the snapshot. Entries whose expiration has already passed are
/// skipped. Returns the number of entries applied.
pub async fn load_snapshot(engine: &CacheEngine, path: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CacheError::io(path, e))?;
    let data: HashMap<String, CacheEntry> =
        serde_json::from_str(&raw).map_err(|source| CacheError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;

    let mut ordered: Vec<(String, CacheEntry)> = data.into_iter().collect();
    ordered.sort_by(|(ka, a), (kb, b)| a.last_access.cmp(&b.last_access).then(ka.cmp(kb)));

    let now = current_timestamp_ms();
    let mut applied = 0;
    for (key, entry) in ordered {
        if entry.is_expired_at(now) {
            debug!(key = %key, "skipping expired snapshot entry");
            continue;
        }

        let ttl = entry.ttl_remaining_ms(now).map(ceil_seconds);
        engine.set(key.clone(), entry.value).await;
        if let Some(ttl) = ttl {
            engine.expire(&key, ttl).await;
        }
        applied += 1;
    }

    info!(count = applied, path = %path.display(), "loaded snapshot");
    Ok(applied)
}
