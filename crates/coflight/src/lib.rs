// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Coalesces duplicate async fetches into a single execution.
//!
//! This crate provides [`Flight`], a mechanism for deduplicating concurrent
//! async operations. When multiple tasks request the same work (identified by
//! a key), only the first task (the "leader") performs the actual work while
//! subsequent tasks (the "followers") wait and receive a clone of the result.
//!
//! The canonical use is cache refill: when a hot key's TTL expires, many
//! readers miss simultaneously, and without coalescing each would issue its
//! own origin fetch.
//!
//! # Example
//!
//! ```
//! use coflight::Flight;
//!
//! # async fn example() {
//! let flight: Flight<&str, String> = Flight::new();
//!
//! // Concurrent calls with the same key share a single execution.
//! let result = flight
//!     .work("detail:public:story-42", || async {
//!         // This expensive fetch runs only once.
//!         "payload".to_string()
//!     })
//!     .await;
//! # }
//! ```
//!
//! # Result sharing and failures
//!
//! The output type only needs `Clone`, so callers coalesce fallible fetches
//! by using `Result<V, E>` with a cloneable error (typically `Arc`-wrapped):
//! every waiter observes the same error. Completed executions, successful or
//! not, are forgotten immediately — a failed fetch is retryable by the very
//! next caller, with no negative caching.
//!
//! # Completion atomicity
//!
//! The in-flight map entry is removed *before* the result lock is released.
//! A caller that joins while the entry exists is a genuine waiter and
//! receives the broadcast result; a caller arriving after completion finds
//! no entry and performs a fresh execution. There is no window in which a
//! finished execution can hand out its result to new arrivals.
//!
//! # Cancellation
//!
//! If the leader's future is dropped before completion, the result lock is
//! released with no result stored and the first waiting follower promotes
//! itself to leader, executing its own closure. Followers never receive a
//! phantom result from a cancelled leader.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use futures::lock::Mutex as AsyncMutex;
use parking_lot::Mutex as SyncMutex;

type SharedMapping<K, T> = Arc<SyncMutex<HashMap<K, Arc<Shared<T>>>>>;

/// Represents a class of work and creates a space in which units of work can
/// be executed with duplicate suppression.
pub struct Flight<K, T> {
    mapping: SharedMapping<K, T>,
}

impl<K, T> std::fmt::Debug for Flight<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flight").finish_non_exhaustive()
    }
}

impl<K, T> Default for Flight<K, T> {
    fn default() -> Self {
        Self { mapping: Arc::default() }
    }
}

impl<K, T> Clone for Flight<K, T> {
    fn clone(&self) -> Self {
        Self {
            mapping: Arc::clone(&self.mapping),
        }
    }
}

/// Per-key broadcast state.
///
/// The async mutex doubles as the execution guard: the leader holds it for
/// the duration of the work, so followers block on `lock()` until either a
/// result is stored or the leader vanished and the slot is still empty.
struct Shared<T> {
    slot: AsyncMutex<Option<T>>,
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self {
            slot: AsyncMutex::new(None),
        }
    }
}

impl<K, T> Flight<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    /// Creates a new `Flight` instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.mapping.lock().len()
    }

    /// Executes `func` for the given key, suppressing duplicates.
    ///
    /// If an execution for `key` is already in flight, this call waits for it
    /// and returns a clone of its result instead of invoking `func`. The
    /// closure is taken by every caller because any follower may be promoted
    /// to leader if the original leader is cancelled.
    pub async fn work<F, Fut>(&self, key: K, func: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let shared = {
            let mut mapping = self.mapping.lock();
            Arc::clone(mapping.entry(key.clone()).or_default())
        };

        let mut slot = shared.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            // A leader finished while we waited; share its result.
            return value.clone();
        }

        // Slot is empty and we hold the lock: we are the leader (either the
        // first caller or a follower promoted after the leader was dropped).
        let value = func().await;
        *slot = Some(value.clone());

        // Remove the mapping entry while still holding the slot lock, so a
        // caller arriving after completion starts a fresh execution.
        let _ = self.mapping.lock().remove(&key);

        value
    }
}
