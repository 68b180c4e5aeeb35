// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Hit/miss/eviction counters for one tier.
///
/// Counters exist for observability only and never affect correctness;
/// relaxed ordering is sufficient.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        let _ = self.hits.fetch_add(1, Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        let _ = self.misses.fetch_add(1, Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        let _ = self.evictions.fetch_add(count, Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TierStats {
        TierStats {
            hits: self.hits.load(Relaxed),
            misses: self.misses.load(Relaxed),
            evictions: self.evictions.load(Relaxed),
        }
    }
}

/// A point-in-time snapshot of a tier's counters.
///
/// Expired lookups count as misses; they do not return data to the normal
/// read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierStats {
    /// Fresh lookups served from the tier.
    pub hits: u64,
    /// Lookups that found nothing usable (including expired entries).
    pub misses: u64,
    /// Entries removed by explicit eviction.
    pub evictions: u64,
}
