//! Persistence Module
//!
//! Two independent collaborators that read from and write into a
//! [`CacheEngine`](crate::cache::CacheEngine) through its public operations:
//! - `log`: append-only operation log, replayable in order
//! - `snapshot`: whole-table JSON snapshot

pub mod log;
pub mod snapshot;

pub use log::{load_from_log, save_to_log, LogRecord, OpLog, Operation};
pub use snapshot::{load_snapshot, save_snapshot};
