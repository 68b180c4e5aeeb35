// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use lamina_clock::Clock;
use lamina_tier::{CacheEntry, ContentKey, KeyPattern, Lookup};
use parking_lot::Mutex;

/// The client's session-lifetime tier.
///
/// Unlike the server tiers this one is synchronous: the render path must be
/// able to consult it without suspending. TTL is evaluated lazily at read
/// time, and an expired entry is reported as [`Lookup::Expired`] so the
/// caller can render it stale while a revalidation runs.
#[derive(Debug)]
pub struct ClientMemoryTier {
    entries: Mutex<HashMap<ContentKey, CacheEntry<Bytes>>>,
    clock: Clock,
    default_ttl: Option<Duration>,
}

impl ClientMemoryTier {
    /// Creates a tier whose entries only expire via per-entry TTLs.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            default_ttl: None,
        }
    }

    /// Creates a tier with a default TTL applied to entries that carry none.
    #[must_use]
    pub fn with_default_ttl(clock: Clock, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            default_ttl: Some(default_ttl),
        }
    }

    /// Looks up a key, reporting freshness.
    #[must_use]
    pub fn get(&self, key: &ContentKey) -> Lookup<Bytes> {
        let Some(entry) = self.entries.lock().get(key).cloned() else {
            return Lookup::Miss;
        };
        if entry.is_expired(self.clock.system_time(), self.default_ttl) {
            Lookup::Expired(entry)
        } else {
            Lookup::Hit(entry)
        }
    }

    /// Inserts an entry, fully replacing any previous entry for the key.
    pub fn insert(&self, key: &ContentKey, mut entry: CacheEntry<Bytes>) {
        entry.ensure_inserted_at(self.clock.system_time());
        let _ = self.entries.lock().insert(key.clone(), entry);
    }

    /// Removes all entries covered by the pattern, returning how many were
    /// removed.
    pub fn evict(&self, pattern: &KeyPattern) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));
        before - entries.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if the tier holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use lamina_clock::ClockControl;
    use lamina_tier::Fingerprint;
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(value: &'static [u8], ttl: Duration) -> CacheEntry<Bytes> {
        CacheEntry::new(Bytes::from_static(value), Fingerprint::new("fp")).with_ttl(ttl)
    }

    #[test]
    fn insert_then_hit() {
        let tier = ClientMemoryTier::new(Clock::new_frozen());
        let key = ContentKey::shared("detail", "story-42");
        tier.insert(&key, entry(b"v1", Duration::from_secs(60)));
        assert!(tier.get(&key).is_hit());
    }

    #[test]
    fn expired_entry_stays_renderable() {
        let control = ClockControl::new();
        let tier = ClientMemoryTier::new(control.to_clock());
        let key = ContentKey::shared("detail", "story-42");

        tier.insert(&key, entry(b"v1", Duration::from_secs(60)));
        control.advance(Duration::from_secs(60));

        let lookup = tier.get(&key);
        assert!(matches!(lookup, Lookup::Expired(_)));
        assert_eq!(lookup.entry().map(|e| e.value().clone()), Some(Bytes::from_static(b"v1")));
    }

    #[test]
    fn prefix_eviction_removes_matching_entries() {
        let tier = ClientMemoryTier::new(Clock::new_frozen());
        tier.insert(
            &ContentKey::scoped("list", "alice", "drafts"),
            entry(b"a", Duration::from_secs(60)),
        );
        tier.insert(
            &ContentKey::scoped("list", "bob", "drafts"),
            entry(b"b", Duration::from_secs(60)),
        );

        let removed = tier.evict(&KeyPattern::prefix("list", Some(lamina_tier::Scope::identity("alice"))));
        assert_eq!(removed, 1);
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn insert_replaces_wholesale() {
        let tier = ClientMemoryTier::new(Clock::new_frozen());
        let key = ContentKey::shared("detail", "story-42");
        tier.insert(&key, entry(b"v1", Duration::from_secs(60)));
        tier.insert(&key, entry(b"v2", Duration::from_secs(60)));

        let lookup = tier.get(&key);
        assert_eq!(lookup.entry().map(|e| e.value().clone()), Some(Bytes::from_static(b"v2")));
        assert_eq!(tier.len(), 1);
    }
}
