use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

/// A value together with the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, stored_at: DateTime<Utc>) -> Self {
        Self { value, stored_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }

    /// Valid iff `now - stored_at < ttl`.
    pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Per-key cache with a single TTL. Values are shared behind `Arc` and only
/// ever replaced whole, so readers never see a half-written value.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<Arc<V>>>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_fresh(&self, key: &K, now: DateTime<Utc>) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.is_valid(now, self.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Last-resort read that ignores the TTL.
    pub fn get_stale(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    pub fn insert(&self, key: K, value: V, now: DateTime<Utc>) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CacheEntry::new(Arc::clone(&value), now));
        value
    }

    /// Drops every entry that has outlived the TTL.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.is_valid(now, self.ttl));
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
