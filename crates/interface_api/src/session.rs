//! Short-lived in-memory store for finished reports
//!
//! Reports hold medical billing details, so they are kept only for a fixed
//! time-to-live. Expiry is checked on every read; a periodic sweep removes
//! entries nobody asked for again.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Keyed store whose entries expire `ttl` after insertion.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct SessionStore<K, V> {
    entries: Arc<RwLock<HashMap<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K, V> SessionStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `value` and returns when it expires
    pub async fn insert(&self, key: K, value: V, now: DateTime<Utc>) -> DateTime<Utc> {
        let expires_at = now + self.ttl;
        self.entries
            .write()
            .await
            .insert(key, Entry { value, expires_at });
        expires_at
    }

    /// Returns the value if it has not expired; an expired entry is dropped
    pub async fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    /// Removes the entry; returns false if there was none
    pub async fn remove(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
