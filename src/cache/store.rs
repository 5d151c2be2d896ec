//! Cache Store Module
//!
//! The entry table itself: HashMap storage combined with LRU tracking and
//! TTL expiration. `CacheStore` is not synchronized; `CacheEngine` wraps it
//! in a lock and every method here runs under that lock.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded entry table with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Activity counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one so a fresh insert always has room.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            lru: LruTracker::with_capacity(capacity.min(4096)),
            stats: CacheStats::new(capacity),
            capacity,
        }
    }

    // == Set ==
    /// Stores a key-value pair, clearing any previous expiration.
    ///
    /// Overwriting an existing key never evicts. Inserting a new key into a
    /// full table evicts the least recently used entry first.
    ///
    /// Returns the evicted key, if any.
    pub fn set(&mut self, key: String, value: String) -> Option<String> {
        self.set_at(key, value, current_timestamp_ms())
    }

    pub(crate) fn set_at(&mut self, key: String, value: String, now: i64) -> Option<String> {
        if let Some(entry) = self.entries.get_mut(&key) {
            *entry = CacheEntry::new(value, now);
            self.lru.touch(&key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, now));
        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, refreshing its recency.
    ///
    /// An expired entry is removed and reported absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.get_at(key, current_timestamp_ms())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: i64) -> Option<String> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired_at(now) {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(key, "lazily expired entry on read");
            return None;
        }

        entry.last_access = now;
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Expire ==
    /// Sets the entry to expire `ttl_seconds` from now.
    ///
    /// Non-positive TTLs are accepted and expire the entry immediately.
    /// Does not count as an access. Returns false if the key is absent.
    pub fn expire(&mut self, key: &str, ttl_seconds: i64) -> bool {
        self.expire_at(key, ttl_seconds, current_timestamp_ms())
    }

    pub(crate) fn expire_at(&mut self, key: &str, ttl_seconds: i64, now: i64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expire_in(ttl_seconds, now);
                true
            }
            None => false,
        }
    }

    // == Purge Expired ==
    /// Removes every entry whose expiration has passed.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }

    pub(crate) fn purge_expired_at(&mut self, now: i64) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Export ==
    /// Returns a deep copy of every unexpired entry.
    pub fn export(&self) -> HashMap<String, CacheEntry> {
        let now = current_timestamp_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Import ==
    /// Replaces the whole table with `data`.
    ///
    /// Recency is rebuilt from each entry's `last_access`. When `data` holds
    /// more entries than the capacity, the least recently accessed ones are
    /// dropped and counted as evictions.
    pub fn import(&mut self, data: HashMap<String, CacheEntry>) {
        let mut ordered: Vec<(String, CacheEntry)> = data.into_iter().collect();
        ordered.sort_by(|(ka, a), (kb, b)| a.last_access.cmp(&b.last_access).then(ka.cmp(kb)));

        let overflow = ordered.len().saturating_sub(self.capacity);
        for _ in 0..overflow {
            self.stats.record_eviction();
        }

        self.entries.clear();
        self.lru.clear();
        for (key, entry) in ordered.into_iter().skip(overflow) {
            self.lru.touch(&key);
            self.entries.insert(key, entry);
        }
        self.stats.set_total_entries(self.entries.len());
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Internals ==
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self.lru.evict_oldest()?;
        self.entries.remove(&victim);
        self.stats.record_eviction();
        debug!(key = %victim, "evicted least recently used entry");
        Some(victim)
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_store_zero_capacity_holds_one() {
        let mut store = CacheStore::new(0);
        store.set(s("a"), s("1"));
        store.set(s("b"), s("2"));
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b"), Some(s("2")));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100);

        store.set(s("key1"), s("value1"));

        assert_eq!(store.get("key1"), Some(s("value1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new(100);

        store.set(s("key1"), s("value1"));

        assert!(store.delete("key1"));
        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
        assert!(!store.delete("key1"));
    }

    #[test]
    fn test_store_overwrite_clears_expiration() {
        let mut store = CacheStore::new(100);

        store.set(s("key1"), s("value1"));
        store.expire_at("key1", 1, 0);
        store.set(s("key1"), s("value2"));

        assert_eq!(store.get("key1"), Some(s("value2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = CacheStore::new(3);

        store.set(s("a"), s("1"));
        store.set(s("b"), s("2"));
        store.set(s("c"), s("3"));

        assert_eq!(store.set(s("a"), s("10")), None);

        assert_eq!(store.len(), 3);
        assert_eq!(store.stats().evictions, 0);
        assert!(store.contains_key("a"));
        assert!(store.contains_key("b"));
        assert!(store.contains_key("c"));
    }

    #[test]
    fn test_store_lazy_expiration() {
        let mut store = CacheStore::new(100);

        store.set_at(s("key1"), s("value1"), 1_000);
        assert!(store.expire_at("key1", 1, 1_000));

        assert_eq!(store.get_at("key1", 1_999), Some(s("value1")));
        assert_eq!(store.get_at("key1", 2_000), None);
        assert!(!store.contains_key("key1"));

        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_expire_missing_key() {
        let mut store = CacheStore::new(100);
        assert!(!store.expire("missing", 10));
    }

    #[test]
    fn test_store_expire_non_positive_ttl() {
        let mut store = CacheStore::new(100);

        store.set(s("a"), s("1"));
        store.set(s("b"), s("2"));
        assert!(store.expire("a", 0));
        assert!(store.expire("b", -5));

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3);

        store.set(s("key1"), s("value1"));
        store.set(s("key2"), s("value2"));
        store.set(s("key3"), s("value3"));

        assert_eq!(store.set(s("key4"), s("value4")), Some(s("key1")));

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3);

        store.set(s("key1"), s("value1"));
        store.set(s("key2"), s("value2"));
        store.set(s("key3"), s("value3"));

        store.get("key1");
        store.get("key3");

        assert_eq!(store.set(s("key4"), s("value4")), Some(s("key2")));
        assert!(store.get("key1").is_some());
        assert!(store.get("key3").is_some());
    }

    #[test]
    fn test_store_expire_does_not_touch() {
        let mut store = CacheStore::new(2);

        store.set(s("a"), s("1"));
        store.set(s("b"), s("2"));
        store.expire("a", 60);

        assert_eq!(store.set(s("c"), s("3")), Some(s("a")));
    }

    #[test]
    fn test_store_get_refreshes_last_access() {
        let mut store = CacheStore::new(10);

        store.set_at(s("a"), s("1"), 100);
        store.get_at("a", 500);

        assert_eq!(store.entries["a"].last_access, 500);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(100);

        store.set(s("key1"), s("value1"));
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.capacity, 100);
    }

    #[test]
    fn test_store_purge_expired() {
        let mut store = CacheStore::new(100);

        store.set_at(s("short"), s("1"), 0);
        store.set_at(s("long"), s("2"), 0);
        store.set_at(s("forever"), s("3"), 0);
        store.expire_at("short", 1, 0);
        store.expire_at("long", 10, 0);

        assert_eq!(store.purge_expired_at(5_000), 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("long"));
        assert!(store.contains_key("forever"));
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_export_skips_expired() {
        let mut store = CacheStore::new(10);

        store.set(s("live"), s("1"));
        store.set(s("dead"), s("2"));
        store.expire("dead", 0);

        let data = store.export();
        assert_eq!(data.len(), 1);
        assert_eq!(data["live"].value, "1");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_import_replaces_and_orders_by_last_access() {
        let mut store = CacheStore::new(3);
        store.set(s("old"), s("x"));

        let mut data = HashMap::new();
        data.insert(s("b"), CacheEntry::new(s("2"), 200));
        data.insert(s("a"), CacheEntry::new(s("1"), 100));
        data.insert(s("c"), CacheEntry::new(s("3"), 300));
        store.import(data);

        assert_eq!(store.len(), 3);
        assert!(!store.contains_key("old"));

        // "a" has the oldest last_access and goes first
        assert_eq!(store.set(s("d"), s("4")), Some(s("a")));
    }

    #[test]
    fn test_store_import_over_capacity_keeps_most_recent() {
        let mut store = CacheStore::new(2);

        let data: HashMap<String, CacheEntry> = (0..5)
            .map(|i| (format!("k{i}"), CacheEntry::new(i.to_string(), i)))
            .collect();
        store.import(data);

        assert_eq!(store.len(), 2);
        assert!(store.contains_key("k3"));
        assert!(store.contains_key("k4"));
        assert_eq!(store.stats().evictions, 3);
    }
}
