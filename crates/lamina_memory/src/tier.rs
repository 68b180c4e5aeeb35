// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! The dashmap-backed tier implementation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use lamina_clock::Clock;
use lamina_tier::{CacheEntry, CacheTier, ContentKey, Error, KeyPattern, Lookup};
use tracing::{Level, event};

use crate::stats::Counters;

/// A concurrent in-memory cache tier.
///
/// Entries are stored in a sharded map; eviction by pattern is atomic with
/// respect to concurrent lookups on a per-shard basis, so a racing `get`
/// observes either the old entry or its absence, never a torn state.
///
/// TTL is evaluated lazily at read time. An expired entry is reported as
/// [`Lookup::Expired`] and kept in place so the degradation path can serve
/// it when the origin is unavailable; it is replaced by the next successful
/// insert or removed by explicit eviction.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lamina_clock::Clock;
/// use lamina_memory::InMemoryTier;
/// use lamina_tier::{CacheEntry, CacheTier, ContentKey, Fingerprint};
///
/// # futures::executor::block_on(async {
/// let tier = InMemoryTier::with_default_ttl(Clock::new_frozen(), Duration::from_secs(300));
/// let key = ContentKey::shared("detail", "story-42");
///
/// tier.insert(&key, CacheEntry::new("payload", Fingerprint::new("fp"))).await?;
/// assert!(tier.get(&key).await?.is_hit());
/// # Ok::<(), lamina_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTier<V> {
    map: Arc<DashMap<ContentKey, CacheEntry<V>>>,
    clock: Clock,
    default_ttl: Option<Duration>,
    counters: Arc<Counters>,
}

impl<V> InMemoryTier<V> {
    /// Creates a tier whose entries only expire via per-entry TTLs.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            clock,
            default_ttl: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Creates a tier with a default TTL applied to entries that carry none.
    #[must_use]
    pub fn with_default_ttl(clock: Clock, default_ttl: Duration) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            clock,
            default_ttl: Some(default_ttl),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Returns the tier-level default TTL, if configured.
    #[must_use]
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Returns a snapshot of the hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> crate::TierStats {
        self.counters.snapshot()
    }
}

impl<V> CacheTier<V> for InMemoryTier<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &ContentKey) -> Result<Lookup<V>, Error> {
        let Some(entry) = self.map.get(key).map(|e| e.clone()) else {
            self.counters.record_miss();
            return Ok(Lookup::Miss);
        };

        if entry.is_expired(self.clock.system_time(), self.default_ttl) {
            self.counters.record_miss();
            Ok(Lookup::Expired(entry))
        } else {
            self.counters.record_hit();
            Ok(Lookup::Hit(entry))
        }
    }

    async fn insert(&self, key: &ContentKey, mut entry: CacheEntry<V>) -> Result<(), Error> {
        entry.ensure_inserted_at(self.clock.system_time());
        // Full replacement: any previous entry for the key is discarded.
        let _ = self.map.insert(key.clone(), entry);
        Ok(())
    }

    async fn evict(&self, pattern: &KeyPattern) -> Result<usize, Error> {
        let removed = match pattern {
            KeyPattern::Exact(key) => usize::from(self.map.remove(key).is_some()),
            KeyPattern::Prefix { .. } => {
                let mut removed = 0usize;
                self.map.retain(|key, _| {
                    let matched = pattern.matches(key);
                    removed += usize::from(matched);
                    !matched
                });
                removed
            }
        };

        if removed > 0 {
            self.counters.record_evictions(removed as u64);
            event!(Level::DEBUG, pattern = %pattern, removed, "evicted cache entries");
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), Error> {
        self.map.clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.map.len() as u64)
    }
}
