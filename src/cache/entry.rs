//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// All timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp, None = no expiration
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Timestamp of the most recent create-or-read
    pub last_access: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new unexpiring entry touched at `now`.
    pub fn new(value: String, now: i64) -> Self {
        Self {
            value,
            expires_at: None,
            last_access: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at the given instant.
    ///
    /// An entry is expired once `now >= expires_at`, so a TTL of zero or less
    /// makes it invisible immediately.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Expire In ==
    /// Sets the expiration to `now + ttl_seconds`.
    pub fn expire_in(&mut self, ttl_seconds: i64, now: i64) {
        self.expires_at = Some(now.saturating_add(ttl_seconds.saturating_mul(1000)));
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self, now: i64) -> Option<i64> {
        self.expires_at.map(|expires| (expires - now).max(0))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts a millisecond span into whole seconds, rounding towards +inf.
pub fn ceil_seconds(millis: i64) -> i64 {
    let secs = millis.div_euclid(1000);
    if millis.rem_euclid(1000) > 0 {
        secs + 1
    } else {
        secs
    }
}
