//! Bounded in-process cache with write-based expiry.
//!
//! Keys are plain strings; grouped helpers prefix them with a [`CacheGroup`]
//! name so one group can be dropped without touching the others.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::CacheSettings;

/// Named partition of the cache key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheGroup {
    /// Root code entries, keyed by natural key
    Code,
}

impl CacheGroup {
    pub fn name(&self) -> &'static str {
        match self {
            CacheGroup::Code => "CODE",
        }
    }

    /// Prefix shared by every key of the group, e.g. `CODE:`.
    pub fn prefix(&self) -> String {
        format!("{}:", self.name())
    }

    pub fn key(&self, key: &str) -> String {
        format!("{}:{}", self.name(), key)
    }
}

impl fmt::Display for CacheGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
struct CacheSlot<V> {
    value: V,
    written_at: Instant,
}

/// Thread-safe cache bounded by entry count, entries expiring a fixed time
/// after their last write.
///
/// Reads neither refresh an entry's lifetime nor its eviction rank: when full,
/// the least recently written entry goes first.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CacheSlot<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.capacity, Duration::from_secs(settings.ttl_secs))
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.peek(key) {
            None => return None,
            Some(slot) => slot.written_at.elapsed() >= self.ttl,
        };
        if expired {
            trace!("cache expired: {}", key);
            entries.pop(key);
            return None;
        }
        entries.peek(key).map(|slot| slot.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        trace!("cache put: {}", key);
        let slot = CacheSlot {
            value,
            written_at: Instant::now(),
        };
        if let Some((evicted, _)) = self.entries.lock().push(key.clone(), slot) {
            if evicted != key {
                debug!("cache full, evicted: {}", evicted);
            }
        }
    }

    /// Remove one key; returns whether it was present.
    pub fn evict(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Remove every key starting with `prefix`; returns how many were removed.
    pub fn evict_by_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key.as_str());
        }
        debug!("cache evicted {} keys with prefix {}", doomed.len(), prefix);
        doomed.len()
    }

    pub fn clear_all(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries that have not expired yet.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(_, slot)| slot.written_at.elapsed() < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_in(&self, group: CacheGroup, key: &str) -> Option<V> {
        self.get(&group.key(key))
    }

    pub fn put_in(&self, group: CacheGroup, key: &str, value: V) {
        self.put(group.key(key), value)
    }

    pub fn evict_in(&self, group: CacheGroup, key: &str) -> bool {
        self.evict(&group.key(key))
    }

    pub fn clear_group(&self, group: CacheGroup) -> usize {
        self.evict_by_prefix(&group.prefix())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}
