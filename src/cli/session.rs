//! Shell Session
//!
//! Executes parsed commands against an engine and the persistence
//! collaborators. The session holds no cache state of its own, only the
//! default file locations and the optional auto-log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::cache::CacheEngine;
use crate::cli::command::{Command, HELP};
use crate::config::Config;
use crate::error::Result;
use crate::persistence::{self, LogRecord, OpLog};

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the reply and read the next line.
    Continue(String),
    /// Print the reply and stop.
    Exit(String),
}

impl Outcome {
    pub fn reply(&self) -> &str {
        match self {
            Outcome::Continue(reply) | Outcome::Exit(reply) => reply,
        }
    }
}

// == Session ==
pub struct Session {
    engine: Arc<CacheEngine>,
    log_file: PathBuf,
    snapshot_file: PathBuf,
    auto_log: Option<OpLog>,
}

impl Session {
    pub fn new(engine: Arc<CacheEngine>, config: &Config) -> Self {
        let auto_log = config.auto_log.then(|| OpLog::new(&config.log_file));
        Self {
            engine,
            log_file: config.log_file.clone(),
            snapshot_file: config.snapshot_file.clone(),
            auto_log,
        }
    }

    pub fn engine(&self) -> &Arc<CacheEngine> {
        &self.engine
    }

    /// Path mutations are currently logged to, if auto-logging is on.
    pub fn auto_log_path(&self) -> Option<&Path> {
        self.auto_log.as_ref().map(OpLog::path)
    }

    /// Parses and executes one input line. Returns `None` for a blank line.
    pub async fn execute_line(&mut self, line: &str) -> Option<Outcome> {
        match Command::parse(line) {
            Ok(Some(command)) => Some(self.execute(command).await),
            Ok(None) => None,
            Err(e) => Some(Outcome::Continue(format!("Error: {e}"))),
        }
    }

    /// Executes a single command.
    pub async fn execute(&mut self, command: Command) -> Outcome {
        let reply = match command {
            Command::Set { key, value } => {
                self.engine.set(key.clone(), value.clone()).await;
                self.log(LogRecord::set(key, value, None)).await;
                "OK".to_string()
            }
            Command::Get { key } => match self.engine.get(&key).await {
                Some(value) => value,
                None => "(nil)".to_string(),
            },
            Command::Del { key } => {
                if self.engine.delete(&key).await {
                    self.log(LogRecord::del(key)).await;
                    "OK".to_string()
                } else {
                    "Key not found".to_string()
                }
            }
            Command::Expire { key, seconds } => {
                if self.engine.expire(&key, seconds).await {
                    self.log(LogRecord::expire(key, seconds)).await;
                    "OK".to_string()
                } else {
                    "Key not found".to_string()
                }
            }
            Command::EnableLog { path } => {
                let path = path.unwrap_or_else(|| self.log_file.clone());
                let reply = format!("Logging enabled to {}", path.display());
                self.auto_log = Some(OpLog::new(path));
                reply
            }
            Command::DisableLog => {
                self.auto_log = None;
                "Logging disabled".to_string()
            }
            Command::Save { path } => {
                let path = path.unwrap_or_else(|| self.log_file.clone());
                report(
                    persistence::save_to_log(&self.engine, &path).await,
                    |n| format!("Saved {n} entries to {}", path.display()),
                )
            }
            Command::Load { path } => {
                let path = path.unwrap_or_else(|| self.log_file.clone());
                report(
                    persistence::load_from_log(&self.engine, &path).await,
                    |n| format!("Loaded {n} records from {}", path.display()),
                )
            }
            Command::Snapshot { path } => {
                let path = path.unwrap_or_else(|| self.snapshot_file.clone());
                report(
                    persistence::save_snapshot(&self.engine, &path).await,
                    |n| format!("Snapshot of {n} entries written to {}", path.display()),
                )
            }
            Command::Restore { path } => {
                let path = path.unwrap_or_else(|| self.snapshot_file.clone());
                report(
                    persistence::load_snapshot(&self.engine, &path).await,
                    |n| format!("Restored {n} entries from {}", path.display()),
                )
            }
            Command::Stats => {
                let stats = self.engine.stats().await;
                format!(
                    "Entries: {}\nCapacity: {}\nHits: {}\nMisses: {}\nHit rate: {:.2}\nEvictions: {}\nExpirations: {}",
                    stats.total_entries,
                    self.engine.capacity(),
                    stats.hits,
                    stats.misses,
                    stats.hit_rate(),
                    stats.evictions,
                    stats.expirations,
                )
            }
            Command::Help => HELP.to_string(),
            Command::Exit => {
                self.engine.shutdown().await;
                return Outcome::Exit("Shutting down cache engine...".to_string());
            }
        };

        Outcome::Continue(reply)
    }

    /// Appends a mutation to the auto-log. Failures are reported, not fatal.
    async fn log(&self, record: LogRecord) {
        let Some(log) = &self.auto_log else {
            return;
        };
        if let Err(e) = log.append(&record).await {
            warn!("failed to append to operation log: {}", e);
        }
    }
}

fn report(result: Result<usize>, ok: impl FnOnce(usize) -> String) -> String {
    match result {
        Ok(n) => ok(n),
        Err(e) => format!("Error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(dir: &Path) -> Session {
        let config = Config {
            log_file: dir.join("cache.log"),
            snapshot_file: dir.join("cache_snapshot.json"),
            ..Config::default()
        };
        Session::new(Arc::new(CacheEngine::new(10)), &config)
    }

    async fn run(session: &mut Session, line: &str) -> String {
        session.execute_line(line).await.unwrap().reply().to_string()
    }

    #[tokio::test]
    async fn test_basic_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        assert_eq!(run(&mut session, "SET k hello world").await, "OK");
        assert_eq!(run(&mut session, "GET k").await, "hello world");
        assert_eq!(run(&mut session, "EXPIRE k 100").await, "OK");
        assert_eq!(run(&mut session, "DEL k").await, "OK");
        assert_eq!(run(&mut session, "GET k").await, "(nil)");
        assert_eq!(run(&mut session, "DEL k").await, "Key not found");
        assert_eq!(run(&mut session, "EXPIRE k 5").await, "Key not found");

        session.engine().shutdown().await;
    }

    #[tokio::test]
    async fn test_errors_are_replies() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        assert!(session.execute_line("   ").await.is_none());
        assert_eq!(run(&mut session, "GET").await, "Error: usage: GET <key>");
        assert!(run(&mut session, "BOGUS").await.starts_with("Error: unknown command"));
        assert!(run(&mut session, "LOAD").await.starts_with("Error: file not found"));

        session.engine().shutdown().await;
    }

    #[tokio::test]
    async fn test_stats_reports_size_and_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        run(&mut session, "SET a 1").await;
        run(&mut session, "GET a").await;
        let stats = run(&mut session, "STATS").await;

        assert!(stats.contains("Entries: 1"));
        assert!(stats.contains("Capacity: 10"));
        assert!(stats.contains("Hits: 1"));

        session.engine().shutdown().await;
    }

    #[tokio::test]
    async fn test_auto_log_records_mutations_only_while_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let log_path = dir.path().join("ops.log");

        run(&mut session, "SET before 0").await;
        let reply = run(&mut session, &format!("ENABLELOG {}", log_path.display())).await;
        assert!(reply.starts_with("Logging enabled"));
        assert_eq!(session.auto_log_path(), Some(log_path.as_path()));

        run(&mut session, "SET a 1").await;
        run(&mut session, "GET a").await;
        run(&mut session, "EXPIRE a 30").await;
        run(&mut session, "DEL missing").await;
        run(&mut session, "DEL a").await;
        run(&mut session, "DISABLELOG").await;
        run(&mut session, "SET after 2").await;

        let content = tokio::fs::read_to_string(&log_path).await.unwrap();
        let records: Vec<LogRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let ops: Vec<_> = records.iter().map(|r| r.operation).collect();
        assert_eq!(
            ops,
            vec![
                persistence::Operation::Set,
                persistence::Operation::Expire,
                persistence::Operation::Del
            ]
        );
        assert!(records.iter().all(|r| r.key == "a"));

        session.engine().shutdown().await;
    }

    #[tokio::test]
    async fn test_save_load_snapshot_restore_between_sessions() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = session_in(dir.path());
        run(&mut first, "SET a 1").await;
        run(&mut first, "SET b 2").await;
        assert!(run(&mut first, "SAVE").await.starts_with("Saved 2 entries"));
        assert!(run(&mut first, "SNAPSHOT").await.starts_with("Snapshot of 2 entries"));
        first.engine().shutdown().await;

        let mut from_log = session_in(dir.path());
        assert!(run(&mut from_log, "LOAD").await.starts_with("Loaded 2 records"));
        assert_eq!(run(&mut from_log, "GET b").await, "2");
        from_log.engine().shutdown().await;

        let mut from_snapshot = session_in(dir.path());
        assert!(run(&mut from_snapshot, "RESTORE").await.starts_with("Restored 2 entries"));
        assert_eq!(run(&mut from_snapshot, "GET a").await, "1");
        from_snapshot.engine().shutdown().await;
    }

    #[tokio::test]
    async fn test_exit_shuts_engine_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let outcome = session.execute(Command::Exit).await;

        assert!(matches!(outcome, Outcome::Exit(_)));
        assert!(session.engine().is_shut_down());
    }
}
