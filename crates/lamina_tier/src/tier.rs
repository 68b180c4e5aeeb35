// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`CacheTier`] defines the interface every backend must implement. The
//! orchestration layer composes tiers without knowing their storage: it
//! routes reads by scope, applies invalidation patterns, and uses the
//! [`Lookup::Expired`] variant to serve stale entries when the origin is
//! unavailable.

use crate::{CacheEntry, ContentKey, Error, KeyPattern};

/// The outcome of a tier lookup.
///
/// Expiry is reported rather than swallowed: an entry past its TTL counts
/// as a miss for the normal read path, but the value is still returned so
/// the degradation path can serve it with a stale marker when the origin
/// is down. Expired entries are physically replaced by the next successful
/// refill or removed by explicit eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// A fresh entry.
    Hit(CacheEntry<V>),
    /// An entry past its TTL, usable only for stale-serving.
    Expired(CacheEntry<V>),
    /// No entry at all.
    Miss,
}

impl<V> Lookup<V> {
    /// Returns `true` for a fresh entry.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Returns `true` when no entry exists at all.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Returns the entry regardless of freshness.
    #[must_use]
    pub fn entry(&self) -> Option<&CacheEntry<V>> {
        match self {
            Self::Hit(entry) | Self::Expired(entry) => Some(entry),
            Self::Miss => None,
        }
    }

    /// Consumes the lookup and returns the entry regardless of freshness.
    #[must_use]
    pub fn into_entry(self) -> Option<CacheEntry<V>> {
        match self {
            Self::Hit(entry) | Self::Expired(entry) => Some(entry),
            Self::Miss => None,
        }
    }
}

/// Trait for cache tier implementations.
///
/// Tier operations never block on I/O in the in-memory backend; the only
/// suspension point on the server read path is the origin fetch, which lives
/// above the tier.
///
/// Eviction accepts a [`KeyPattern`] and must be atomic with respect to
/// concurrent `get` calls: a lookup racing an eviction observes either the
/// old entry or its absence, never a torn state.
pub trait CacheTier<V>: Send + Sync {
    /// Looks up a key, reporting freshness.
    fn get(&self, key: &ContentKey) -> impl Future<Output = Result<Lookup<V>, Error>> + Send;

    /// Inserts an entry, fully replacing any previous entry for the key.
    fn insert(&self, key: &ContentKey, entry: CacheEntry<V>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes all entries covered by the pattern, returning how many were removed.
    fn evict(&self, pattern: &KeyPattern) -> impl Future<Output = Result<usize, Error>> + Send;

    /// Removes all entries.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the number of entries, if the backend tracks size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the tier holds no entries, if the backend tracks size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}
