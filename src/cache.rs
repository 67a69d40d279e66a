// src/cache.rs
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time-to-live for cached results
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created) > ttl
    }
}

/// Key/value store with a fixed time-to-live measured from the write.
///
/// Expiry is lazy: an expired entry stays in the table until a `get` for its
/// key notices it and removes it. Reads never extend an entry's lifetime.
/// Many `get`s run concurrently; `set` and the expiry removal take the write
/// lock.
///
/// With a capacity set, inserting a new key into a full table first drops
/// expired entries and then, if still full, the entry written longest ago.
#[derive(Debug)]
pub struct ResultCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: Option<usize>,
}

impl<V: Clone> ResultCache<V> {
    /// Unbounded cache with the default one hour TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        ResultCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: None,
        }
    }

    /// Limit the number of entries. A capacity of zero is treated as one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity.max(1));
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.entries.write();

        if let Some(capacity) = self.capacity {
            if !entries.contains_key(&key) && entries.len() >= capacity {
                self.make_room(&mut entries, capacity, now);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                created: now,
            },
        );
    }

    /// Look up a live entry. An expired entry is removed and reported missing.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    tracing::debug!(key, "cache miss");
                    return None;
                }
                Some(entry) if !entry.is_expired(now, self.ttl) => {
                    tracing::debug!(key, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Upgrade to the write lock. Another writer may have replaced the
        // entry in between, so only remove it if it is still expired.
        let mut entries = self.entries.write();
        let expired = entries
            .get(key)
            .map(|entry| entry.is_expired(now, self.ttl));
        match expired {
            Some(true) => {
                entries.remove(key);
                tracing::debug!(key, "cache entry expired");
                None
            }
            Some(false) => entries.get(key).map(|entry| entry.value.clone()),
            None => None,
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn make_room(
        &self,
        entries: &mut HashMap<String, CacheEntry<V>>,
        capacity: usize,
        now: Instant,
    ) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl));

        while entries.len() >= capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }

        tracing::debug!(
            evicted = before - entries.len(),
            capacity,
            "cache full, evicted entries"
        );
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
