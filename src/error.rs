//! Error types for the cache
//!
//! Engine operations never fail; misses are ordinary results. Errors come
//! from the persistence boundary and from parsing user commands.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache collaborators.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Persistence file does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading or writing a persistence file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A newline-terminated log line is not valid JSON for a record
    #[error("malformed log record at {}:{line}: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A log record parsed but lacks a field its operation needs
    #[error("invalid log record at {}:{line}: {reason}", .path.display())]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Snapshot content could not be encoded or decoded
    #[error("snapshot error in {}: {source}", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Log record could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unrecognized command verb
    #[error("unknown command '{0}'. Type HELP for the list of commands")]
    UnknownCommand(String),

    /// Command given with the wrong arguments
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Command argument has the wrong shape
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Wraps an I/O error, mapping "not found" to [`CacheError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CacheError::FileNotFound(path)
        } else {
            CacheError::Io { path, source }
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let err = CacheError::io("missing.log", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CacheError::FileNotFound(_)));
        assert_eq!(err.to_string(), "file not found: missing.log");
    }

    #[test]
    fn test_io_other_keeps_cause() {
        let err = CacheError::io("x.log", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(err.to_string().starts_with("I/O error on x.log"));
    }

    #[test]
    fn test_usage_message() {
        let err = CacheError::Usage("GET <key>");
        assert_eq!(err.to_string(), "usage: GET <key>");
    }
}
