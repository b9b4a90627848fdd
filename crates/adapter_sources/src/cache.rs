//! Read-through TTL cache with single-flight fetches.
//!
//! Every key owns a slot guarded by an async mutex. A reader that misses
//! holds the slot lock for the duration of the fetch, so concurrent readers
//! of the same key queue on the lock and then find the fresh entry instead
//! of fetching again. Readers of different keys never contend.

use chrono::Utc;
use feed_core::Provenance;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Result of a cache read.
#[derive(Debug)]
pub struct CacheRead<V> {
    /// Payload
    pub value: Arc<V>,
    /// Provenance of the fetch that produced the payload
    pub provenance: Provenance,
    /// When the payload was fetched (epoch ms)
    pub fetched_at: i64,
    /// True when served from a fresh entry without fetching
    pub cached: bool,
}

impl<V> Clone for CacheRead<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            provenance: self.provenance,
            fetched_at: self.fetched_at,
            cached: self.cached,
        }
    }
}

struct Entry<V> {
    value: Arc<V>,
    provenance: Provenance,
    fetched_at: i64,
    stored: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored.elapsed() < ttl
    }

    fn read(&self, cached: bool) -> CacheRead<V> {
        CacheRead {
            value: Arc::clone(&self.value),
            provenance: self.provenance,
            fetched_at: self.fetched_at,
            cached,
        }
    }
}

type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

/// Keyed cache whose entries expire `ttl` after they were fetched.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the fresh entry for `key`, or run `fetch` and store its result.
    ///
    /// At most one `fetch` runs per key at a time. Expired entries of other
    /// keys are purged on every miss.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> CacheRead<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (V, Provenance)>,
    {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        if let Some(current) = entry.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            return current.read(true);
        }

        let purged = self.purge_expired().await;
        if purged > 0 {
            debug!(purged, "purged expired cache entries");
        }

        let (value, provenance) = fetch().await;
        let stored = Entry {
            value: Arc::new(value),
            provenance,
            fetched_at: Utc::now().timestamp_millis(),
            stored: Instant::now(),
        };
        let read = stored.read(false);
        *entry = Some(stored);
        read
    }

    /// Drop the entry for `key`. Waits for an in-flight fetch of that key.
    ///
    /// Returns `true` if an entry was present.
    pub async fn invalidate(&self, key: &K) -> bool {
        let slot = self.slots.lock().await.get(key).cloned();
        match slot {
            Some(slot) => slot.lock().await.take().is_some(),
            None => false,
        }
    }

    /// Drop every entry. Returns the number of entries dropped.
    pub async fn invalidate_all(&self) -> usize {
        let slots: Vec<Slot<V>> = self.slots.lock().await.values().cloned().collect();
        let mut dropped = 0;
        for slot in slots {
            if slot.lock().await.take().is_some() {
                dropped += 1;
            }
        }
        dropped
    }

    /// Whether `key` has a fresh entry. Does not wait on an in-flight fetch.
    pub async fn contains_fresh(&self, key: &K) -> bool {
        let Some(slot) = self.slots.lock().await.get(key).cloned() else {
            return false;
        };
        let fresh = match slot.try_lock() {
            Ok(entry) => entry.as_ref().is_some_and(|e| e.is_fresh(self.ttl)),
            Err(_) => false,
        };
        fresh
    }

    /// Remove slots whose entry is missing or expired. Slots with a fetch
    /// in flight, or held by a reader about to lock them, are kept.
    /// Returns the number of slots removed.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => entry.as_ref().is_some_and(|e| e.is_fresh(ttl)),
                Err(_) => true,
            }
        });
        before - slots.len()
    }

    /// Number of slots, fresh or not
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// True when the cache holds no slots
    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    async fn slot(&self, key: K) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(key).or_default())
    }
}
