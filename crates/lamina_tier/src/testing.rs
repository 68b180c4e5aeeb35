// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Mock tier implementation for testing.
//!
//! This module provides [`MockTier`], a configurable in-memory tier that
//! records all operations and supports failure injection for testing error
//! paths, plus forced-expiry so degradation paths can be exercised without
//! a clock.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{CacheEntry, CacheTier, ContentKey, Error, KeyPattern, Lookup};

/// Recorded tier operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOp<V> {
    /// A get operation was performed with the given key.
    Get(ContentKey),
    /// An insert operation was performed with the given key and entry.
    Insert {
        /// The key that was inserted.
        key: ContentKey,
        /// The entry that was inserted.
        entry: CacheEntry<V>,
    },
    /// An evict operation was performed with the given pattern.
    Evict(KeyPattern),
    /// A clear operation was performed.
    Clear,
}

type FailPredicate<V> = Box<dyn Fn(&TierOp<V>) -> bool + Send + Sync>;

/// A configurable mock tier for testing.
///
/// Stores values in memory, records every operation for later verification,
/// and can be configured to fail operations on demand.
///
/// # Examples
///
/// ```
/// use lamina_tier::testing::{MockTier, TierOp};
/// use lamina_tier::{CacheEntry, CacheTier, ContentKey, Fingerprint};
///
/// # futures::executor::block_on(async {
/// let tier = MockTier::<i32>::new();
/// let key = ContentKey::shared("detail", "story-42");
///
/// tier.insert(&key, CacheEntry::new(42, Fingerprint::new("fp"))).await?;
/// assert!(tier.get(&key).await?.is_hit());
///
/// // Fail all evictions to exercise the incomplete-invalidation path.
/// tier.fail_when(|op| matches!(op, TierOp::Evict(_)));
/// # Ok::<(), lamina_tier::Error>(())
/// # });
/// ```
pub struct MockTier<V> {
    data: Arc<Mutex<HashMap<ContentKey, CacheEntry<V>>>>,
    expired: Arc<Mutex<HashSet<ContentKey>>>,
    operations: Arc<Mutex<Vec<TierOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockTier<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTier")
            .field("data", &self.data)
            .field("expired", &self.expired)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockTier<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            expired: Arc::clone(&self.expired),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockTier<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockTier<V> {
    /// Creates an empty mock tier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            expired: Arc::new(Mutex::new(HashSet::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Configures a predicate; operations it matches fail with
    /// [`Error::Unavailable`].
    pub fn fail_when(&self, predicate: impl Fn(&TierOp<V>) -> bool + Send + Sync + 'static) {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Removes any configured failure predicate.
    pub fn fail_never(&self) {
        *self.fail_when.lock() = None;
    }

    /// Marks a key so subsequent lookups report [`Lookup::Expired`].
    pub fn mark_expired(&self, key: &ContentKey) {
        let _ = self.expired.lock().insert(key.clone());
    }

    /// Returns all recorded operations in order.
    #[must_use]
    pub fn operations(&self) -> Vec<TierOp<V>>
    where
        V: Clone,
    {
        self.operations.lock().clone()
    }

    /// Returns how many get operations were recorded.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, TierOp::Get(_)))
            .count()
    }

    fn check(&self, op: &TierOp<V>) -> Result<(), Error> {
        if let Some(predicate) = self.fail_when.lock().as_ref()
            && predicate(op)
        {
            return Err(Error::unavailable("injected failure"));
        }
        Ok(())
    }
}

impl<V> CacheTier<V> for MockTier<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &ContentKey) -> Result<Lookup<V>, Error> {
        let op = TierOp::Get(key.clone());
        self.operations.lock().push(op.clone());
        self.check(&op)?;

        Ok(match self.data.lock().get(key).cloned() {
            Some(entry) if self.expired.lock().contains(key) => Lookup::Expired(entry),
            Some(entry) => Lookup::Hit(entry),
            None => Lookup::Miss,
        })
    }

    async fn insert(&self, key: &ContentKey, entry: CacheEntry<V>) -> Result<(), Error> {
        let op = TierOp::Insert {
            key: key.clone(),
            entry: entry.clone(),
        };
        self.operations.lock().push(op.clone());
        self.check(&op)?;

        let _ = self.expired.lock().remove(key);
        let _ = self.data.lock().insert(key.clone(), entry);
        Ok(())
    }

    async fn evict(&self, pattern: &KeyPattern) -> Result<usize, Error> {
        let op = TierOp::Evict(pattern.clone());
        self.operations.lock().push(op.clone());
        self.check(&op)?;

        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|key, _| !pattern.matches(key));
        self.expired.lock().retain(|key| !pattern.matches(key));
        Ok(before - data.len())
    }

    async fn clear(&self) -> Result<(), Error> {
        let op = TierOp::Clear;
        self.operations.lock().push(op.clone());
        self.check(&op)?;

        self.data.lock().clear();
        self.expired.lock().clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
