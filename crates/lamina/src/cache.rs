// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::time::Duration;

use bytes::Bytes;
use coflight::Flight;
use lamina_clock::Clock;
use lamina_service::{CacheStatus, ReadRequest, ReadResponse, WriteOutcome, WriteRequest};
use lamina_tier::{CacheEntry, CacheTier, ContentKey, Fingerprint, KeyPattern, Lookup};
use tracing::{Level, event};

use crate::codec;
use crate::fingerprint::Fingerprinter;
use crate::invalidation::{InvalidationBus, InvalidationDirective, Mutation};
use crate::origin::{ListSelector, OriginStore};
use crate::policy::{CachePolicies, ContentKind};
use crate::{Error, Result};

/// The server-side read-through cache.
///
/// Reads are routed by scope to one of two tiers, refilled from the origin
/// through a request coalescer on miss, and answered with a fingerprint so
/// clients can revalidate cheaply. Writes commit to the origin first, then
/// apply the derived invalidation directive to both tiers before reporting
/// success, so a read that observes a completed write never sees the old
/// entry from these tiers.
///
/// # Degradation
///
/// When the origin cannot be reached on a refill, an expired entry that is
/// still physically present is served marked stale instead of failing the
/// read. When a coalesced refill exceeds the configured deadline, the caller
/// abandons the shared flight and fetches directly.
#[derive(Debug)]
pub struct ContentCache<O, TS, TP> {
    origin: O,
    shared_tier: TS,
    scoped_tier: TP,
    bus: InvalidationBus<TS, TP>,
    policies: CachePolicies,
    fingerprinter: Fingerprinter,
    flight: Flight<ContentKey, Result<(Bytes, Fingerprint)>>,
    clock: Clock,
    coalesce_timeout: Option<Duration>,
}

impl<O, TS, TP> ContentCache<O, TS, TP>
where
    O: OriginStore,
    TS: CacheTier<Bytes> + Clone,
    TP: CacheTier<Bytes> + Clone,
{
    /// Starts building a cache over an origin store and two server tiers.
    pub fn builder(origin: O, shared_tier: TS, scoped_tier: TP, policies: CachePolicies) -> ContentCacheBuilder<O, TS, TP> {
        ContentCacheBuilder {
            origin,
            shared_tier,
            scoped_tier,
            policies,
            clock: Clock::default(),
            coalesce_timeout: None,
        }
    }

    /// Reads one key, refilling from the origin on miss.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] for an undeclared namespace,
    /// [`Error::NotFound`] if the origin has no such resource, and
    /// [`Error::Origin`] if the origin is unavailable and no stale entry
    /// exists to serve instead.
    pub async fn read(&self, request: &ReadRequest) -> Result<ReadResponse> {
        let key = &request.key;
        let policy = self.policies.policy(key.namespace())?;
        let kind = policy.kind();
        let ttl = policy.ttl_for(key.scope());

        let lookup = self.lookup(key).await;
        if let Lookup::Hit(entry) = &lookup {
            let remaining = self.remaining_ttl(entry, ttl);
            if request.if_none_match.as_ref() == Some(entry.fingerprint()) {
                return Ok(ReadResponse::not_modified(entry.fingerprint().clone(), remaining));
            }
            return Ok(ReadResponse::with_payload(
                CacheStatus::Hit,
                entry.fingerprint().clone(),
                remaining,
                entry.value().clone(),
            ));
        }

        match self.coalesced_refill(key, kind, ttl).await {
            Ok((payload, fingerprint)) => {
                if request.if_none_match.as_ref() == Some(&fingerprint) {
                    return Ok(ReadResponse::not_modified(fingerprint, ttl));
                }
                Ok(ReadResponse::with_payload(CacheStatus::Miss, fingerprint, ttl, payload))
            }
            Err(Error::NotFound { resource }) => {
                // The resource is gone from the origin; drop any expired
                // remnant so it cannot be served stale later.
                if lookup.entry().is_some() {
                    self.evict_exact(key).await;
                }
                Err(Error::NotFound { resource })
            }
            Err(error) => match lookup.into_entry() {
                Some(entry) => {
                    event!(Level::WARN, key = %key, error = %error, "origin unavailable, serving stale entry");
                    // A caller holding the same bytes needs no retransmission
                    // even in degraded mode; the zero TTL hint still tells it
                    // to retry soon.
                    if request.if_none_match.as_ref() == Some(entry.fingerprint()) {
                        return Ok(ReadResponse::not_modified(entry.fingerprint().clone(), Duration::ZERO));
                    }
                    Ok(ReadResponse::with_payload(
                        CacheStatus::Stale,
                        entry.fingerprint().clone(),
                        Duration::ZERO,
                        entry.value().clone(),
                    ))
                }
                None => Err(error),
            },
        }
    }

    /// Commits a mutation to the origin, then invalidates both tiers.
    ///
    /// The invalidation runs to completion before this returns; a caller
    /// that observes the returned outcome and then reads through this cache
    /// sees the new value. An incomplete invalidation is reported in the
    /// outcome, not turned into an error: the write itself is durable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Origin`] if the origin rejects the commit; nothing
    /// is invalidated in that case.
    pub async fn write(&self, request: &WriteRequest) -> Result<WriteOutcome> {
        let value = self.origin.put(&request.resource, request.value.clone()).await?;

        let mutation = Mutation::of(request);
        let directive = InvalidationDirective::for_mutation(&self.policies, &mutation);
        let invalidation = self.bus.apply(&directive).await;

        event!(
            Level::DEBUG,
            resource = %request.resource,
            scope = %request.scope,
            evicted = invalidation.evicted,
            complete = invalidation.is_complete(),
            "write committed and invalidation applied"
        );
        Ok(WriteOutcome { value, invalidation })
    }

    /// Looks up the key in the tier its scope routes to.
    ///
    /// A tier failure is absorbed as a miss: the refill path below can still
    /// satisfy the read from the origin.
    async fn lookup(&self, key: &ContentKey) -> Lookup<Bytes> {
        let looked_up = if key.scope().is_shared() {
            self.shared_tier.get(key).await
        } else {
            self.scoped_tier.get(key).await
        };
        looked_up.unwrap_or_else(|error| {
            event!(Level::WARN, key = %key, error = %error, "tier lookup failed, treating as miss");
            Lookup::Miss
        })
    }

    /// Refills through the coalescer, failing open to a direct fetch when
    /// the shared flight exceeds the configured deadline.
    async fn coalesced_refill(&self, key: &ContentKey, kind: ContentKind, ttl: Duration) -> Result<(Bytes, Fingerprint)> {
        let flight = self.flight.work(key.clone(), || self.refill(key, kind, ttl));
        match self.coalesce_timeout {
            None => flight.await,
            Some(limit) => match tokio::time::timeout(limit, flight).await {
                Ok(result) => result,
                Err(_) => {
                    event!(Level::WARN, key = %key, "coalesced refill exceeded its deadline, fetching directly");
                    self.refill(key, kind, ttl).await
                }
            },
        }
    }

    /// Fetches the key's content from the origin and installs the new entry.
    ///
    /// Runs once per coalesced flight, in the leader. The insert fully
    /// replaces any expired entry for the key.
    async fn refill(&self, key: &ContentKey, kind: ContentKind, ttl: Duration) -> Result<(Bytes, Fingerprint)> {
        let payload = match kind {
            ContentKind::Detail => self
                .origin
                .get(key.resource())
                .await?
                .ok_or_else(|| Error::not_found(key.resource()))?,
            ContentKind::List => {
                let selector = ListSelector::from_key(key);
                codec::encode_list(&self.origin.list(&selector).await?)
            }
        };

        let fingerprint = self.fingerprinter.fingerprint(&payload);
        let entry = CacheEntry::new(payload.clone(), fingerprint.clone()).with_ttl(ttl);
        let inserted = if key.scope().is_shared() {
            self.shared_tier.insert(key, entry).await
        } else {
            self.scoped_tier.insert(key, entry).await
        };
        if let Err(error) = inserted {
            // The fetched content is still good; serve it uncached.
            event!(Level::WARN, key = %key, error = %error, "tier insert failed after refill");
        }
        Ok((payload, fingerprint))
    }

    async fn evict_exact(&self, key: &ContentKey) {
        let pattern = KeyPattern::exact(key.clone());
        let evicted = if key.scope().is_shared() {
            self.shared_tier.evict(&pattern).await
        } else {
            self.scoped_tier.evict(&pattern).await
        };
        if let Err(error) = evicted {
            event!(Level::WARN, key = %key, error = %error, "failed to evict entry for a deleted resource");
        }
    }

    fn remaining_ttl(&self, entry: &CacheEntry<Bytes>, ttl: Duration) -> Duration {
        match entry.inserted_at() {
            Some(inserted_at) => ttl.saturating_sub(self.clock.elapsed_since(inserted_at)),
            None => ttl,
        }
    }
}

/// Builder for [`ContentCache`].
#[derive(Debug)]
pub struct ContentCacheBuilder<O, TS, TP> {
    origin: O,
    shared_tier: TS,
    scoped_tier: TP,
    policies: CachePolicies,
    clock: Clock,
    coalesce_timeout: Option<Duration>,
}

impl<O, TS, TP> ContentCacheBuilder<O, TS, TP>
where
    O: OriginStore,
    TS: CacheTier<Bytes> + Clone,
    TP: CacheTier<Bytes> + Clone,
{
    /// Overrides the clock; tests inject a controlled clock here.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Bounds how long a caller waits on a coalesced refill before fetching
    /// directly. Unset means wait indefinitely.
    #[must_use]
    pub fn coalesce_timeout(mut self, limit: Duration) -> Self {
        self.coalesce_timeout = Some(limit);
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> ContentCache<O, TS, TP> {
        ContentCache {
            origin: self.origin,
            bus: InvalidationBus::new(self.shared_tier.clone(), self.scoped_tier.clone()),
            shared_tier: self.shared_tier,
            scoped_tier: self.scoped_tier,
            policies: self.policies,
            fingerprinter: Fingerprinter::new(),
            flight: Flight::new(),
            clock: self.clock,
            coalesce_timeout: self.coalesce_timeout,
        }
    }
}
