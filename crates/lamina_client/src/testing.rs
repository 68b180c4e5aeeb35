// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Test doubles for client storage.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::persistent::{StorageBackend, StorageError};

/// An in-memory [`StorageBackend`] standing in for platform-local storage,
/// with an optional byte quota to exercise write-failure handling.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<HashMap<String, Vec<u8>>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates an unbounded backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that refuses writes once its total stored bytes
    /// would exceed `quota`.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.lock();
        if let Some(quota) = self.quota {
            let occupied: usize = data
                .iter()
                .filter(|(stored, _)| stored.as_str() != key)
                .map(|(_, stored)| stored.len())
                .sum();
            if occupied + value.len() > quota {
                return Err(StorageError::new("quota exceeded"));
            }
        }
        let _ = data.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _ = self.data.lock().remove(key);
        Ok(())
    }
}
