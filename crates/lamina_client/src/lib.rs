// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Client-side tiers and the stale-while-revalidate reader for the lamina
//! content cache.
//!
//! A client keeps two tiers of its own below the server's: a session-scoped
//! memory tier and a bounded persistent tier that survives restarts. Both
//! are synchronous, because they sit on the render path: [`ContentReader::read`]
//! returns whatever is cached without suspending, and the caller paints it
//! immediately, stale or not, while [`ContentReader::revalidate`] confirms
//! or replaces it over the network using the entry's fingerprint as a
//! conditional header.
//!
//! Persisted entries are written as versioned, optionally compressed
//! records; a record from another schema version or one that fails to
//! decode is silently discarded rather than rendered.

mod memory;
mod persistent;
mod reader;
mod record;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use memory::ClientMemoryTier;
#[doc(inline)]
pub use persistent::{ClientPersistentTier, DEFAULT_CAPACITY, StorageBackend, StorageError};
#[doc(inline)]
pub use reader::{CachedView, ClientRead, ContentReader, FetchError, FetchOutcome, Fetcher, RevalidationToken};
#[doc(inline)]
pub use record::RecordError;
