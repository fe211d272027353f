use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl_seconds: i64) -> Self {
        Self {
            value,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// String-keyed map of entries that expire `ttl_seconds` after insertion.
/// A TTL of zero or less disables caching.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl_seconds: i64,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_seconds,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());
        if fresh.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        fresh
    }

    pub fn insert(&self, key: String, value: T) {
        if self.ttl_seconds <= 0 {
            return;
        }
        self.entries.retain(|_, entry| !entry.is_expired());
        self.entries
            .insert(key, CacheEntry::new(value, self.ttl_seconds));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
