//! Operation Log
//!
//! Append-only JSON-lines log of cache mutations. Each line is one
//! [`LogRecord`]; replaying the file in order rebuilds the cache contents.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::cache::{ceil_seconds, current_timestamp_ms, CacheEngine};
use crate::error::{CacheError, Result};

// == Operation ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Set,
    Del,
    Expire,
}

// == Log Record ==
/// One logged mutation. Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub operation: Operation,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// When the record was produced
    pub timestamp: i64,
}

impl LogRecord {
    pub fn set(key: impl Into<String>, value: impl Into<String>, expires_at: Option<i64>) -> Self {
        Self {
            operation: Operation::Set,
            key: key.into(),
            value: Some(value.into()),
            expires_at,
            timestamp: current_timestamp_ms(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self {
            operation: Operation::Del,
            key: key.into(),
            value: None,
            expires_at: None,
            timestamp: current_timestamp_ms(),
        }
    }

    /// Records an EXPIRE issued now with a relative TTL.
    pub fn expire(key: impl Into<String>, ttl_seconds: i64) -> Self {
        let timestamp = current_timestamp_ms();
        Self {
            operation: Operation::Expire,
            key: key.into(),
            value: None,
            expires_at: Some(timestamp.saturating_add(ttl_seconds.saturating_mul(1000))),
            timestamp,
        }
    }

    /// TTL in whole seconds as seen when the record was written.
    pub fn relative_ttl(&self) -> Option<i64> {
        self.expires_at
            .map(|expires_at| ceil_seconds(expires_at.saturating_sub(self.timestamp)))
    }
}

// == Op Log ==
/// Append-only writer for a log file.
#[derive(Debug, Clone)]
pub struct OpLog {
    path: PathBuf,
}

impl OpLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record.
    pub async fn append(&self, record: &LogRecord) -> Result<()> {
        self.append_all(std::slice::from_ref(record)).await
    }

    /// Appends records in order with a single write.
    pub async fn append_all(&self, records: &[LogRecord]) -> Result<()> {
        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        file.flush().await.map_err(|e| CacheError::io(&self.path, e))?;
        Ok(())
    }
}

// == Save ==
/// Appends a SET record for every live entry of `engine` to `path`.
///
/// Returns the number of records written.
pub async fn save_to_log(engine: &CacheEngine, path: &Path) -> Result<usize> {
    let data = engine.export_data().await;

    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort_by_key(|key| data[*key].last_access);

    let records: Vec<LogRecord> = keys
        .into_iter()
        .map(|key| {
            let entry = &data[key];
            LogRecord::set(key.clone(), entry.value.clone(), entry.expires_at)
        })
        .collect();

    OpLog::new(path).append_all(&records).await?;
    info!(count = records.len(), path = %path.display(), "saved cache to log");
    Ok(records.len())
}

// == Load ==
/// Replays the log at `path` into `engine`, in file order.
///
/// Returns the number of records applied. A final line without a newline
/// that does not parse is treated as a torn write and ends the replay.
/// Any other malformed line aborts with an error; records before it stay
/// applied.
pub async fn load_from_log(engine: &CacheEngine, path: &Path) -> Result<usize> {
    let file = File::open(path)
        .await
        .map_err(|e| CacheError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut applied = 0;
    let mut line_no = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| CacheError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let terminated = line.ends_with(b"\n");
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        // Invalid UTF-8 surfaces as a parse error like any other bad record
        let record: LogRecord = match serde_json::from_slice(&line) {
            Ok(record) => record,
            Err(_) if !terminated => {
                warn!(line = line_no, path = %path.display(), "ignoring truncated trailing log record");
                break;
            }
            Err(source) => {
                return Err(CacheError::MalformedRecord {
                    path: path.to_path_buf(),
                    line: line_no,
                    source,
                })
            }
        };

        apply_record(engine, &record)
            .await
            .map_err(|reason| CacheError::InvalidRecord {
                path: path.to_path_buf(),
                line: line_no,
                reason,
            })?;
        applied += 1;
    }

    info!(count = applied, path = %path.display(), "replayed operation log");
    Ok(applied)
}

/// Applies one record to the engine.
async fn apply_record(engine: &CacheEngine, record: &LogRecord) -> std::result::Result<(), String> {
    match record.operation {
        Operation::Set => {
            let value = record
                .value
                .clone()
                .ok_or_else(|| format!("SET record for '{}' has no value", record.key))?;
            engine.set(record.key.clone(), value).await;
            if let Some(ttl) = record.relative_ttl() {
                engine.expire(&record.key, ttl).await;
            }
        }
        Operation::Del => {
            engine.delete(&record.key).await;
        }
        Operation::Expire => {
            let ttl = record
                .relative_ttl()
                .ok_or_else(|| format!("EXPIRE record for '{}' has no expiration", record.key))?;
            if !engine.expire(&record.key, ttl).await {
                debug!(key = %record.key, "EXPIRE replayed for absent key");
            }
        }
    }
    Ok(())
}
