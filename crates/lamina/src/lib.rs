// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! A read-through content cache with coherent invalidation.
//!
//! The cache sits between a content service and its origin store. Reads are
//! addressed by [`ContentKey`] and routed by scope: shared content lives in
//! one tier serving every reader, per-identity content in another. A miss
//! refills from the origin through a request coalescer, so a thundering herd
//! on a hot key collapses into a single origin fetch. Every response carries
//! a content [`Fingerprint`] that clients echo back for cheap revalidation.
//!
//! Writes commit to the origin first, then apply a derived
//! [`InvalidationDirective`] to both tiers before the write reports success.
//! Combined with TTLs as the backstop bound on staleness, this gives
//! read-your-writes through the cache without any cross-key coordination.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use lamina::{CachePolicies, CacheStatus, ContentCache, ContentKey, ReadRequest};
//! use lamina_clock::Clock;
//! use lamina_memory::InMemoryTier;
//! # use lamina::{ListSelector, OriginError, OriginStore};
//! # struct Origin;
//! # impl OriginStore for Origin {
//! #     async fn get(&self, _id: &str) -> Result<Option<Bytes>, OriginError> {
//! #         Ok(Some(Bytes::from_static(b"payload")))
//! #     }
//! #     async fn list(&self, _selector: &ListSelector) -> Result<Vec<Bytes>, OriginError> {
//! #         Ok(Vec::new())
//! #     }
//! #     async fn put(&self, _id: &str, value: Bytes) -> Result<Bytes, OriginError> {
//! #         Ok(value)
//! #     }
//! # }
//!
//! # futures::executor::block_on(async {
//! let clock = Clock::new_frozen();
//! let cache = ContentCache::builder(
//!     Origin,
//!     InMemoryTier::new(clock.clone()),
//!     InMemoryTier::new(clock.clone()),
//!     CachePolicies::content_defaults(),
//! )
//! .clock(clock)
//! .build();
//!
//! let request = ReadRequest::new(ContentKey::shared("detail", "story-42"));
//! let first = cache.read(&request).await?;
//! assert_eq!(first.status, CacheStatus::Miss);
//!
//! let second = cache.read(&request).await?;
//! assert_eq!(second.status, CacheStatus::Hit);
//! # Ok::<(), lamina::Error>(())
//! # });
//! ```

mod cache;
pub mod codec;
mod error;
mod fingerprint;
mod invalidation;
mod origin;
mod policy;

#[doc(inline)]
pub use cache::{ContentCache, ContentCacheBuilder};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use fingerprint::Fingerprinter;
#[doc(inline)]
pub use invalidation::{InvalidationBus, InvalidationDirective, Mutation};
#[doc(inline)]
pub use origin::{ListSelector, OriginError, OriginStore};
#[doc(inline)]
pub use policy::{CachePolicies, CachePoliciesBuilder, ContentKind, NamespacePolicy, PolicyError};

pub use lamina_service::{CacheStatus, InvalidationReport, ReadRequest, ReadResponse, WriteOutcome, WriteRequest};
pub use lamina_tier::{CacheEntry, CacheTier, ContentKey, Fingerprint, KeyPattern, Lookup, Scope};
