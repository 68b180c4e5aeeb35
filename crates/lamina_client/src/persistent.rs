// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::collections::VecDeque;

use bytes::Bytes;
use lamina_clock::Clock;
use lamina_tier::{CacheEntry, ContentKey, KeyPattern, Lookup};
use parking_lot::Mutex;
use tracing::{Level, event};

use crate::record::{self, RecordError};

/// Default bound on the number of persisted records.
pub const DEFAULT_CAPACITY: usize = 50;

/// An error from the storage backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage backend failed: {reason}")]
pub struct StorageError {
    reason: String,
}

impl StorageError {
    /// Creates an error with a human-readable cause.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Synchronous string-keyed blob storage, the shape of platform-local
/// storage on every client target.
///
/// `set` may fail under quota pressure; the tier responds by shedding its
/// oldest records, so a backend should fail the write rather than evict
/// behind the tier's back.
pub trait StorageBackend: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Writes a value, fully replacing any previous one.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Deletes a value. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

impl<B> StorageBackend for std::sync::Arc<B>
where
    B: StorageBackend + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

/// The client's cross-session tier.
///
/// Entries are stored as versioned records (see the record format) under a
/// key prefix, with an insertion-order index persisted alongside them. The
/// record count is bounded: inserting past capacity sheds the
/// least-recently-inserted records, and a backend write failure (quota) is
/// answered the same way.
///
/// All operations are synchronous; this tier sits on the render path.
#[derive(Debug)]
pub struct ClientPersistentTier<B> {
    backend: B,
    clock: Clock,
    prefix: String,
    capacity: usize,
    index: Mutex<VecDeque<ContentKey>>,
}

impl<B> ClientPersistentTier<B>
where
    B: StorageBackend,
{
    /// Opens the tier over a backend, loading the persisted index.
    ///
    /// An unreadable index is discarded: the tier starts empty rather than
    /// failing to construct, and orphaned records age out of the backend as
    /// keys are reused.
    #[must_use]
    pub fn new(backend: B, clock: Clock) -> Self {
        Self::with_capacity(backend, clock, DEFAULT_CAPACITY)
    }

    /// Opens the tier with an explicit record bound.
    #[must_use]
    pub fn with_capacity(backend: B, clock: Clock, capacity: usize) -> Self {
        let prefix = "lamina".to_owned();
        let index = load_index(&backend, &index_key(&prefix));
        Self {
            backend,
            clock,
            prefix,
            capacity,
            index: Mutex::new(index),
        }
    }

    /// Looks up a key, reporting freshness.
    ///
    /// A record that cannot be decoded is deleted and reported as a miss; a
    /// record written under a different schema version is discarded the same
    /// way, silently.
    #[must_use]
    pub fn get(&self, key: &ContentKey) -> Lookup<Bytes> {
        let storage_key = self.storage_key(key);
        let bytes = match self.backend.get(&storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Lookup::Miss,
            Err(error) => {
                event!(Level::WARN, key = %key, error = %error, "persistent tier read failed, treating as miss");
                return Lookup::Miss;
            }
        };

        match record::decode(&bytes) {
            Ok(entry) => {
                if entry.is_expired(self.clock.system_time(), None) {
                    Lookup::Expired(entry)
                } else {
                    Lookup::Hit(entry)
                }
            }
            Err(RecordError::SchemaVersion { found }) => {
                event!(Level::DEBUG, key = %key, found, "discarding record from another schema version");
                self.remove(key);
                Lookup::Miss
            }
            Err(error) => {
                event!(Level::WARN, key = %key, error = %error, "discarding corrupt record");
                self.remove(key);
                Lookup::Miss
            }
        }
    }

    /// Inserts an entry, fully replacing any previous record for the key.
    ///
    /// Sheds least-recently-inserted records to stay within capacity, and
    /// again if the backend refuses the write for space.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write still fails with the tier
    /// otherwise empty.
    pub fn insert(&self, key: &ContentKey, mut entry: CacheEntry<Bytes>) -> Result<(), StorageError> {
        entry.ensure_inserted_at(self.clock.system_time());
        let bytes = record::encode(&entry).map_err(|error| StorageError::new(error.to_string()))?;
        let storage_key = self.storage_key(key);

        let mut index = self.index.lock();
        index.retain(|indexed| indexed != key);
        index.push_back(key.clone());

        while index.len() > self.capacity {
            if let Some(oldest) = index.pop_front() {
                self.delete_record(&oldest);
            }
        }

        let mut written = self.backend.set(&storage_key, &bytes);
        while written.is_err() && index.len() > 1 {
            if let Some(oldest) = index.pop_front() {
                self.delete_record(&oldest);
            }
            written = self.backend.set(&storage_key, &bytes);
        }
        if written.is_err() {
            index.retain(|indexed| indexed != key);
        }
        self.persist_index(&index);
        written
    }

    /// Removes all records covered by the pattern, returning how many were
    /// removed.
    pub fn evict(&self, pattern: &KeyPattern) -> usize {
        let mut index = self.index.lock();
        let mut removed = 0usize;
        index.retain(|key| {
            if pattern.matches(key) {
                self.delete_record(key);
                removed += 1;
                false
            } else {
                true
            }
        });
        self.persist_index(&index);
        removed
    }

    /// Removes every record and the index.
    pub fn clear(&self) {
        let mut index = self.index.lock();
        for key in index.drain(..) {
            if let Err(error) = self.backend.delete(&storage_key(&self.prefix, &key)) {
                event!(Level::WARN, key = %key, error = %error, "failed to delete record");
            }
        }
        if let Err(error) = self.backend.delete(&index_key(&self.prefix)) {
            event!(Level::WARN, error = %error, "failed to delete the persisted index");
        }
    }

    /// Returns the number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.lock().len()
    }

    /// Returns `true` if the tier holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.lock().is_empty()
    }

    fn remove(&self, key: &ContentKey) {
        let mut index = self.index.lock();
        index.retain(|indexed| indexed != key);
        self.delete_record(key);
        self.persist_index(&index);
    }

    fn delete_record(&self, key: &ContentKey) {
        if let Err(error) = self.backend.delete(&storage_key(&self.prefix, key)) {
            event!(Level::WARN, key = %key, error = %error, "failed to delete record");
        }
    }

    fn persist_index(&self, index: &VecDeque<ContentKey>) {
        match bincode::serialize(index) {
            Ok(bytes) => {
                if let Err(error) = self.backend.set(&index_key(&self.prefix), &bytes) {
                    event!(Level::WARN, error = %error, "failed to persist the index");
                }
            }
            Err(error) => {
                event!(Level::WARN, error = %error, "failed to serialize the index");
            }
        }
    }

    fn storage_key(&self, key: &ContentKey) -> String {
        storage_key(&self.prefix, key)
    }
}

fn storage_key(prefix: &str, key: &ContentKey) -> String {
    format!("{prefix}:{key}")
}

// Cannot collide with a content key: a rendered scope is never empty.
fn index_key(prefix: &str) -> String {
    format!("{prefix}::index")
}

fn load_index<B: StorageBackend>(backend: &B, index_key: &str) -> VecDeque<ContentKey> {
    match backend.get(index_key) {
        Ok(Some(bytes)) => match bincode::deserialize(&bytes) {
            Ok(index) => index,
            Err(error) => {
                event!(Level::WARN, error = %error, "persisted index is unreadable, starting empty");
                VecDeque::new()
            }
        },
        Ok(None) => VecDeque::new(),
        Err(error) => {
            event!(Level::WARN, error = %error, "could not load the persisted index, starting empty");
            VecDeque::new()
        }
    }
}
