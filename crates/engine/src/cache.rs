//! Process-local TTL cache.
//!
//! A pure cache: losing or serving a stale entry within the TTL bound is a
//! performance concern, never a correctness one. Expiry is lazy, checked on
//! read; there is no background sweep. An independent process or a restart
//! starts empty.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

struct Entry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// Per-student TTL cache keyed by student id.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Fresh entry for `key`, or `None` when absent or expired. An entry is
    /// expired once its age reaches the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// [`Self::get`] with an injected clock, for tests.
    #[must_use]
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now - entry.cached_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: V) {
        self.set_at(key, value, Utc::now());
    }

    /// [`Self::set`] with an injected clock, for tests.
    pub fn set_at(&self, key: &str, value: V, now: DateTime<Utc>) {
        self.lock().insert(key.to_owned(), Entry { value, cached_at: now });
    }

    /// Drop the entry regardless of freshness. Must be called by every code
    /// path that mutates the data the cached value was derived from.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A poisoned cache is recoverable: the map only holds derived data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
