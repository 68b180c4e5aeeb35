// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::time::Duration;

use bytes::Bytes;
use lamina_tier::{Fingerprint, KeyPattern};

/// How the cache satisfied a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a fresh server-tier entry.
    Hit,
    /// Refilled from the origin store.
    Miss,
    /// Origin unavailable; served from a possibly-expired entry.
    Stale,
    /// The caller's fingerprint matches current content; no payload sent.
    NotModified,
}

impl CacheStatus {
    /// Returns the header-style rendering of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Stale => "STALE",
            Self::NotModified => "NOT_MODIFIED",
        }
    }
}

/// The response to a [`ReadRequest`](crate::ReadRequest).
///
/// Always carries the current fingerprint and a TTL hint so clients can
/// bound their own tiers; the payload is absent only for
/// [`CacheStatus::NotModified`].
#[derive(Debug, Clone)]
pub struct ReadResponse {
    /// How the read was satisfied.
    pub status: CacheStatus,
    /// Fingerprint of the current content.
    pub fingerprint: Fingerprint,
    /// How long the served entry is considered fresh.
    pub ttl_hint: Duration,
    /// The content, absent for `NotModified`.
    pub payload: Option<Bytes>,
}

impl ReadResponse {
    /// Creates a response carrying a payload.
    #[must_use]
    pub fn with_payload(status: CacheStatus, fingerprint: Fingerprint, ttl_hint: Duration, payload: Bytes) -> Self {
        Self {
            status,
            fingerprint,
            ttl_hint,
            payload: Some(payload),
        }
    }

    /// Creates a `NotModified` response with no payload.
    #[must_use]
    pub fn not_modified(fingerprint: Fingerprint, ttl_hint: Duration) -> Self {
        Self {
            status: CacheStatus::NotModified,
            fingerprint,
            ttl_hint,
            payload: None,
        }
    }

    /// Returns `true` if the caller's copy is still current.
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        self.status == CacheStatus::NotModified
    }
}

/// What happened when an invalidation directive was applied.
///
/// A non-empty `failed` list means some tier kept entries the directive
/// should have removed; those keys serve stale data until their TTL expires.
/// This is reported rather than retried — an asynchronous retry could
/// reorder against a subsequent write to the same key.
#[derive(Debug, Clone, Default)]
pub struct InvalidationReport {
    /// Number of entries actually removed across tiers.
    pub evicted: usize,
    /// Patterns that could not be applied to some tier.
    pub failed: Vec<KeyPattern>,
}

impl InvalidationReport {
    /// Returns `true` when every pattern was applied to every tier.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The response to a [`WriteRequest`](crate::WriteRequest).
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The value as committed by the origin store.
    pub value: Bytes,
    /// The result of applying the derived invalidation directive.
    pub invalidation: InvalidationReport,
}
