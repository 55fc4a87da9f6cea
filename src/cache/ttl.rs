use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Fresh,
    Stale,
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    last_access: Instant,
}

/// Time-bounded memo table keyed by string.
///
/// Entries are valid while `now - stored_at < ttl`. Stale entries are never
/// returned and are overwritten by the next insert for the same key. When the
/// table is full, stale entries are swept first and then the least recently
/// accessed entry makes room.
pub struct TtlCache<V> {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_fresh(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        if !self.is_fresh(entry, now) {
            return None;
        }
        entry.last_access = now;
        Some(entry.value.clone())
    }

    pub fn state(&self, key: &str) -> EntryState {
        let now = self.clock.now();
        match self.lock().get(key) {
            None => EntryState::Empty,
            Some(entry) if self.is_fresh(entry, now) => EntryState::Fresh,
            Some(_) => EntryState::Stale,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < self.ttl);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_access)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    log::debug!("cache full, evicting {}", oldest);
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
                last_access: now,
            },
        );
    }

    /// Return the fresh value for `key`, or run `compute` and store its
    /// successful result. Errors are passed through and never cached.
    ///
    /// The lock is not held while `compute` runs, so concurrent misses on the
    /// same key may compute twice; the last one to finish wins.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            log::debug!("cache hit: {}", key);
            return Ok(value);
        }

        log::debug!("cache miss: {}", key);
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache(ttl_secs: u64, capacity: usize) -> (TtlCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn entry_lifecycle() {
        let (cache, clock) = cache(300, 8);
        assert_eq!(cache.state("k"), EntryState::Empty);

        cache.insert("k", 1);
        assert_eq!(cache.state("k"), EntryState::Fresh);
        assert_eq!(cache.get("k"), Some(1));

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("k"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.state("k"), EntryState::Stale);
        assert_eq!(cache.get("k"), None);
        // stale entries are not swept on read
        assert_eq!(cache.len(), 1);

        cache.insert("k", 2);
        assert_eq!(cache.state("k"), EntryState::Fresh);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn full_cache_sweeps_stale_entries_first() {
        let (cache, clock) = cache(10, 2);
        cache.insert("a", 1);
        clock.advance(Duration::from_secs(5));
        cache.insert("b", 2);
        clock.advance(Duration::from_secs(6));

        // "a" is stale, "b" is still fresh
        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.state("a"), EntryState::Empty);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn full_cache_evicts_least_recently_used() {
        let (cache, clock) = cache(300, 2);
        cache.insert("a", 1);
        clock.advance(Duration::from_secs(1));
        cache.insert("b", 2);
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("a"), Some(1));
        clock.advance(Duration::from_secs(1));

        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn overwriting_existing_key_does_not_evict() {
        let (cache, _clock) = cache(300, 2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 3);
        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[tokio::test]
    async fn compute_runs_once_per_ttl_window() {
        let (cache, clock) = cache(300, 8);
        let mut calls = 0;

        for _ in 0..3 {
            let v: Result<u32, ()> = cache
                .get_or_try_compute("k", || {
                    calls += 1;
                    async { Ok(7) }
                })
                .await;
            assert_eq!(v, Ok(7));
        }
        assert_eq!(calls, 1);

        clock.advance(Duration::from_secs(300));
        let _: Result<u32, ()> = cache
            .get_or_try_compute("k", || {
                calls += 1;
                async { Ok(8) }
            })
            .await;
        assert_eq!(calls, 2);
        assert_eq!(cache.get("k"), Some(8));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let (cache, _clock) = cache(300, 8);
        let v: Result<u32, &str> = cache.get_or_try_compute("k", || async { Err("down") }).await;
        assert_eq!(v, Err("down"));
        assert_eq!(cache.state("k"), EntryState::Empty);
    }
}
