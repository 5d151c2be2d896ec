//! Cache Module
//!
//! In-process caching with TTL expiration and LRU eviction.

mod engine;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use engine::{CacheEngine, DEFAULT_CAPACITY, DEFAULT_SWEEP_INTERVAL};
pub use entry::{ceil_seconds, current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
