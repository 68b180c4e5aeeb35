// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::fmt;
use std::time::{Duration, SystemTime};

/// A deterministic digest of cached content.
///
/// Fingerprints are a pure function of the stored value: two entries holding
/// equal bytes must carry equal fingerprints. This is what makes conditional
/// reads sound — comparing fingerprints stands in for comparing payloads.
///
/// The digest is computed over caller-significant bytes only. Timestamps the
/// server attaches after a fetch live in entry metadata, never inside the
/// fingerprinted payload; folding them in would make every response differ
/// and conditional reads would never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already-computed digest.
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Returns the digest as a string slice, suitable for a header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached value with fingerprint, timestamp, and TTL metadata.
///
/// Entries are immutable once stored: a refresh replaces the whole entry
/// (value, fingerprint, and timestamp together), never parts of it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lamina_tier::{CacheEntry, Fingerprint};
///
/// let entry = CacheEntry::new("payload", Fingerprint::new("abc123"))
///     .with_ttl(Duration::from_secs(3600));
/// assert_eq!(*entry.value(), "payload");
/// assert_eq!(entry.ttl(), Some(Duration::from_secs(3600)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    fingerprint: Fingerprint,
    inserted_at: Option<SystemTime>,
    /// Per-entry TTL. If set, takes precedence over the tier-level TTL.
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    /// Creates a new entry with the given value and fingerprint.
    ///
    /// The timestamp is set by the tier when the entry is inserted.
    pub fn new(value: V, fingerprint: Fingerprint) -> Self {
        Self {
            value,
            fingerprint,
            inserted_at: None,
            ttl: None,
        }
    }

    /// Sets a per-entry TTL, overriding the tier-level TTL for this entry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the content fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Returns when this entry was inserted, if it has been inserted.
    #[must_use]
    pub fn inserted_at(&self) -> Option<SystemTime> {
        self.inserted_at
    }

    /// Stamps the insertion time unless one is already present.
    ///
    /// Tiers call this on insert; entries recreated from persistent storage
    /// arrive with their original timestamp, which is preserved.
    pub fn ensure_inserted_at(&mut self, inserted_at: SystemTime) {
        if self.inserted_at.is_none() {
            self.inserted_at = Some(inserted_at);
        }
    }

    /// Overrides the insertion time.
    ///
    /// Used when rehydrating entries from persistent storage.
    pub fn set_inserted_at(&mut self, inserted_at: SystemTime) {
        self.inserted_at = Some(inserted_at);
    }

    /// Returns the per-entry TTL, if set.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns `true` if the entry is past its TTL at `now`.
    ///
    /// The per-entry TTL takes precedence over `tier_ttl`. An entry without
    /// a timestamp is treated as expired when any TTL applies: it cannot
    /// prove its freshness. Without any TTL the entry never expires.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime, tier_ttl: Option<Duration>) -> bool {
        let Some(ttl) = self.ttl.or(tier_ttl) else {
            return false;
        };
        match self.inserted_at {
            // A backwards clock jump yields zero age, not an error.
            Some(inserted_at) => now.duration_since(inserted_at).unwrap_or(Duration::ZERO) >= ttl,
            None => true,
        }
    }
}
