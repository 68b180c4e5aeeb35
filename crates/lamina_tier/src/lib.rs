// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Core abstractions for the lamina content cache.
//!
//! This crate defines the vocabulary shared by every cache tier in the
//! workspace: [`ContentKey`] and [`Scope`] for addressing, [`KeyPattern`] for
//! eviction directives, [`CacheEntry`] for stored values with fingerprint and
//! TTL metadata, the [`CacheTier`] trait that storage backends implement, and
//! the [`Error`] type for fallible tier operations.
//!
//! # Key identity
//!
//! A key is the composite of namespace, scope, resource, and an optional
//! sub-resource. Two keys that differ only in scope are distinct entries that
//! never share storage; per-identity isolation in the scoped tier falls out
//! of key identity rather than any runtime check.
//!
//! # Implementing a Cache Tier
//!
//! Implement all required methods of [`CacheTier`]:
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! use lamina_tier::{CacheEntry, CacheTier, ContentKey, Error, KeyPattern, Lookup};
//!
//! struct SimpleTier<V>(RwLock<HashMap<ContentKey, CacheEntry<V>>>);
//!
//! impl<V> CacheTier<V> for SimpleTier<V>
//! where
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &ContentKey) -> Result<Lookup<V>, Error> {
//!         Ok(match self.0.read().unwrap().get(key).cloned() {
//!             Some(entry) => Lookup::Hit(entry),
//!             None => Lookup::Miss,
//!         })
//!     }
//!
//!     async fn insert(&self, key: &ContentKey, entry: CacheEntry<V>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.clone(), entry);
//!         Ok(())
//!     }
//!
//!     async fn evict(&self, pattern: &KeyPattern) -> Result<usize, Error> {
//!         let mut map = self.0.write().unwrap();
//!         let before = map.len();
//!         map.retain(|key, _| !pattern.matches(key));
//!         Ok(before - map.len())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```

mod entry;
pub mod error;
mod key;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use entry::{CacheEntry, Fingerprint};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use key::{ContentKey, KeyPattern, Scope};
#[doc(inline)]
pub use tier::{CacheTier, Lookup};
