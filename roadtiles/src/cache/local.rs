//! Bounded in-process tile store with TTL and least-recently-accessed eviction.
//!
//! Entries live in a sharded `DashMap`, so lookups and inserts on different
//! keys do not block one another. Each entry carries a logical access tick
//! drawn from a shared counter; when the store grows past `max_entries` the
//! entries with the oldest ticks are evicted in one batch.
//!
//! Eviction sorts a snapshot of all ticks, which is O(n log n) in the number
//! of entries but only runs on inserts that overflow the cap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use super::traits::CachedTile;

struct LocalEntry {
    value: CachedTile,
    inserted_at: Instant,
    last_access: AtomicU64,
}

impl LocalEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// Local (primary) cache tier.
pub struct LocalTileStore {
    entries: DashMap<String, LocalEntry>,
    ttl: Duration,
    max_entries: usize,
    clock: AtomicU64,
    eviction_lock: Mutex<()>,
}

impl LocalTileStore {
    /// Create a store holding at most `max_entries` tiles for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            clock: AtomicU64::new(0),
            eviction_lock: Mutex::new(()),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up a tile, refreshing its access time on a hit.
    ///
    /// Expired entries are removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<CachedTile> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(self.ttl, now) {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }

        // The read guard must be released before removing from the same shard.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(self.ttl, now));
        trace!(key, "Local cache entry expired");
        None
    }

    /// Insert or replace a tile.
    ///
    /// Returns the number of entries evicted to get back under the cap.
    pub fn insert(&self, key: &str, value: CachedTile) -> usize {
        let entry = LocalEntry {
            value,
            inserted_at: Instant::now(),
            last_access: AtomicU64::new(self.tick()),
        };
        self.entries.insert(key.to_string(), entry);

        if self.entries.len() > self.max_entries {
            self.evict_overflow()
        } else {
            0
        }
    }

    fn evict_overflow(&self) -> usize {
        let _guard = self.eviction_lock.lock();

        let len = self.entries.len();
        if len <= self.max_entries {
            return 0;
        }
        let overflow = len - self.max_entries;

        let mut by_access: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().last_access.load(Ordering::Relaxed),
                )
            })
            .collect();
        by_access.sort_unstable_by_key(|(_, tick)| *tick);

        let mut evicted = 0;
        for (key, _) in by_access.into_iter().take(overflow) {
            if self.entries.remove(&key).is_some() {
                trace!(key = key.as_str(), "Evicted least recently accessed tile");
                evicted += 1;
            }
        }
        evicted
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(self.ttl, now));
        before.saturating_sub(self.entries.len())
    }

    /// Whether a live entry exists for `key`. Does not refresh access time.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.ttl, Instant::now()))
    }

    /// Current number of stored entries (including not-yet-purged expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries that have not yet expired.
    pub fn live_len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(self.ttl, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
