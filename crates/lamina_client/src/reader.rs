// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use coflight::Flight;
use lamina_clock::Clock;
use lamina_tier::{CacheEntry, ContentKey, Fingerprint, KeyPattern, Lookup};
use tracing::{Level, event};

use crate::memory::ClientMemoryTier;
use crate::persistent::{ClientPersistentTier, StorageBackend};

/// The result of a conditional network fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The presented fingerprint still matches; no payload was transferred.
    NotModified {
        /// How long the server considers the content fresh.
        ttl_hint: Duration,
    },
    /// New content.
    Fresh {
        /// The content.
        payload: Bytes,
        /// Its fingerprint.
        fingerprint: Fingerprint,
        /// How long the server considers it fresh.
        ttl_hint: Duration,
    },
}

/// An error from the network fetch.
#[derive(Debug, Clone, thiserror::Error)]
#[error("fetch failed: {reason}")]
pub struct FetchError {
    reason: String,
}

impl FetchError {
    /// Creates an error with a human-readable cause.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// The transport the reader revalidates through, presenting the cached
/// fingerprint as a conditional header.
pub trait Fetcher: Send + Sync {
    /// Fetches a key's content, conditional on a previously seen fingerprint.
    fn fetch(
        &self,
        key: &ContentKey,
        if_none_match: Option<&Fingerprint>,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

impl<F> Fetcher for Arc<F>
where
    F: Fetcher + ?Sized,
{
    fn fetch(
        &self,
        key: &ContentKey,
        if_none_match: Option<&Fingerprint>,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send {
        (**self).fetch(key, if_none_match)
    }
}

/// Cancellation handle for one read's revalidation.
///
/// Cancelling marks the revalidation dead: whatever the network returns
/// afterwards, the tiers are not touched on its behalf. Used when the view
/// that initiated the read is torn down before the response arrives.
#[derive(Debug, Clone, Default)]
pub struct RevalidationToken(Arc<AtomicBool>);

impl RevalidationToken {
    fn new() -> Self {
        Self::default()
    }

    /// Marks the revalidation cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A renderable cached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedView {
    /// The content.
    pub payload: Bytes,
    /// Its fingerprint.
    pub fingerprint: Fingerprint,
    /// `false` when the entry is past its TTL and served for immediate
    /// paint only.
    pub fresh: bool,
}

impl CachedView {
    fn of(entry: &CacheEntry<Bytes>, fresh: bool) -> Self {
        Self {
            payload: entry.value().clone(),
            fingerprint: entry.fingerprint().clone(),
            fresh,
        }
    }
}

/// What a read hands the caller synchronously.
#[derive(Debug)]
pub struct ClientRead {
    /// The best cached value, if any; render it immediately.
    pub cached: Option<CachedView>,
    /// Token to pass to [`ContentReader::revalidate`], and to cancel if the
    /// caller goes away.
    pub token: RevalidationToken,
    /// `true` when a revalidation should be started: the cached value is
    /// stale, absent, or was just restored from persistent storage and has
    /// not been confirmed by this process yet.
    pub needs_revalidation: bool,
}

/// The client-side stale-while-revalidate reader.
///
/// `read` is synchronous and never touches the network: it consults the
/// memory tier, then the persistent tier, and hands back whatever it finds
/// together with a verdict on freshness. When the verdict says so, the
/// caller starts `revalidate` concurrently with rendering; it resolves to
/// new content only if the content actually changed.
///
/// Concurrent revalidations of one key are coalesced into a single fetch.
pub struct ContentReader<F, B> {
    fetcher: F,
    memory: Arc<ClientMemoryTier>,
    persistent: Arc<ClientPersistentTier<B>>,
    clock: Clock,
    flight: Flight<ContentKey, Result<FetchOutcome, FetchError>>,
}

impl<F, B> std::fmt::Debug for ContentReader<F, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentReader").finish_non_exhaustive()
    }
}

impl<F, B> ContentReader<F, B>
where
    F: Fetcher,
    B: StorageBackend,
{
    /// Creates a reader over the two client tiers.
    pub fn new(fetcher: F, memory: Arc<ClientMemoryTier>, persistent: Arc<ClientPersistentTier<B>>, clock: Clock) -> Self {
        Self {
            fetcher,
            memory,
            persistent,
            clock,
            flight: Flight::new(),
        }
    }

    /// Reads a key from the client tiers, without suspending.
    #[must_use]
    pub fn read(&self, key: &ContentKey) -> ClientRead {
        let token = RevalidationToken::new();

        match self.memory.get(key) {
            Lookup::Hit(entry) => {
                return ClientRead {
                    cached: Some(CachedView::of(&entry, true)),
                    token,
                    needs_revalidation: false,
                };
            }
            Lookup::Expired(entry) => {
                return ClientRead {
                    cached: Some(CachedView::of(&entry, false)),
                    token,
                    needs_revalidation: true,
                };
            }
            Lookup::Miss => {}
        }

        match self.persistent.get(key) {
            Lookup::Hit(entry) => {
                // Promote so the rest of the session reads from memory. The
                // record predates this process, so it is still confirmed
                // against the network once behind the paint; the conditional
                // fetch answers not-modified when nothing changed.
                self.memory.insert(key, entry.clone());
                ClientRead {
                    cached: Some(CachedView::of(&entry, true)),
                    token,
                    needs_revalidation: true,
                }
            }
            Lookup::Expired(entry) => {
                self.memory.insert(key, entry.clone());
                ClientRead {
                    cached: Some(CachedView::of(&entry, false)),
                    token,
                    needs_revalidation: true,
                }
            }
            Lookup::Miss => ClientRead {
                cached: None,
                token,
                needs_revalidation: true,
            },
        }
    }

    /// Revalidates a key against the network.
    ///
    /// Resolves to `Ok(None)` when the cached content is still current (or
    /// the token was cancelled), `Ok(Some(view))` when new content arrived
    /// and the tiers were updated.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the network fails; the tiers keep
    /// whatever they had.
    pub async fn revalidate(&self, key: &ContentKey, token: &RevalidationToken) -> Result<Option<CachedView>, FetchError> {
        let current = self.current_fingerprint(key);
        let outcome = self
            .flight
            .work(key.clone(), || async { self.fetcher.fetch(key, current.as_ref()).await })
            .await?;

        if token.is_cancelled() {
            event!(Level::DEBUG, key = %key, "revalidation cancelled, discarding result");
            return Ok(None);
        }

        match outcome {
            FetchOutcome::NotModified { ttl_hint } => {
                self.refresh(key, ttl_hint);
                Ok(None)
            }
            FetchOutcome::Fresh {
                payload,
                fingerprint,
                ttl_hint,
            } => {
                let mut entry = CacheEntry::new(payload.clone(), fingerprint.clone()).with_ttl(ttl_hint);
                entry.set_inserted_at(self.clock.system_time());
                self.memory.insert(key, entry.clone());
                if let Err(error) = self.persistent.insert(key, entry) {
                    event!(Level::WARN, key = %key, error = %error, "could not persist revalidated entry");
                }
                Ok(Some(CachedView {
                    payload,
                    fingerprint,
                    fresh: true,
                }))
            }
        }
    }

    /// Removes all client entries covered by the pattern, returning how many
    /// were removed. Applied after the application's own writes.
    pub fn evict(&self, pattern: &KeyPattern) -> usize {
        self.memory.evict(pattern) + self.persistent.evict(pattern)
    }

    /// Drops everything from both client tiers.
    pub fn clear(&self) {
        self.memory.clear();
        self.persistent.clear();
    }

    fn current_fingerprint(&self, key: &ContentKey) -> Option<Fingerprint> {
        // A stale fingerprint is still valid for conditional requests; the
        // content may not have changed since it expired.
        self.memory
            .get(key)
            .into_entry()
            .or_else(|| self.persistent.get(key).into_entry())
            .map(|entry| entry.fingerprint().clone())
    }

    /// Re-stamps the cached entry after the network confirmed it is still
    /// current.
    fn refresh(&self, key: &ContentKey, ttl_hint: Duration) {
        let Some(entry) = self
            .memory
            .get(key)
            .into_entry()
            .or_else(|| self.persistent.get(key).into_entry())
        else {
            return;
        };

        let mut entry = entry.with_ttl(ttl_hint);
        entry.set_inserted_at(self.clock.system_time());
        self.memory.insert(key, entry.clone());
        if let Err(error) = self.persistent.insert(key, entry) {
            event!(Level::WARN, key = %key, error = %error, "could not persist refreshed entry");
        }
    }
}
