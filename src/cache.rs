//! In-memory result cache.
//!
//! Maps a request fingerprint to a computed result and evicts entries past
//! their configured lifetime. The map is bounded; when full, the oldest
//! entry is dropped to make room.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Fingerprint of an operation call: operation name plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(operation: &str, args: impl fmt::Debug) -> Self {
        Self(format!("{}:{:?}", operation, args))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// A TTL-checked, size-bounded cache safe to share between threads.
pub struct ResultCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_entries > 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>> {
        // Entries are plain values; a poisoned lock leaves nothing half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(&self, entries: &mut HashMap<CacheKey, CacheEntry<V>>) {
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.created_at.elapsed() <= ttl);
    }

    /// Returns the cached value if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = self.lock();
        self.purge_expired(&mut entries);

        match entries.get(key) {
            Some(entry) => {
                debug!("Cache hit for key: {}", key);
                Some(entry.value.clone())
            }
            None => {
                debug!("Cache miss for key: {}", key);
                None
            }
        }
    }

    /// Stores a value, evicting the oldest entry if the cache is full.
    pub fn insert(&self, key: CacheKey, value: V) {
        if !self.is_enabled() {
            return;
        }

        let mut entries = self.lock();
        self.purge_expired(&mut entries);

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(victim) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone())
            {
                debug!("Cache evicting key: {}", victim);
                entries.remove(&victim);
            }
        }

        debug!("Cache set for key: {}", key);
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Removes one entry. Returns true if it existed.
    pub fn delete(&self, key: &CacheKey) -> bool {
        let removed = self.lock().remove(key).is_some();
        if removed {
            debug!("Cache deleted for key: {}", key);
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
        debug!("Cache cleared");
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        self.purge_expired(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value or computes, stores and returns it.
    ///
    /// Errors are returned as-is and never cached. The lock is not held
    /// while `compute` runs, so concurrent misses on the same key both
    /// compute and the last writer wins.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
