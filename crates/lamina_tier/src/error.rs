// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Error types for cache tier operations.

/// An error from a cache tier operation.
///
/// Tier operations are infallible for the built-in in-memory backend, but
/// the trait allows remote or storage-backed tiers where operations can
/// fail. The read path treats a corrupt entry as a miss; an unavailable tier
/// during invalidation is a correctness-affecting failure that the
/// invalidation bus reports to operators.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The backing store could not serve the operation.
    #[error("cache tier unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause, carried for the operator log.
        reason: String,
    },

    /// A stored entry could not be decoded.
    #[error("stored entry for `{key}` is corrupt: {reason}")]
    CorruptEntry {
        /// Rendered form of the affected key.
        key: String,
        /// Human-readable cause.
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    /// Creates an [`Error::CorruptEntry`].
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptEntry {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized [`Result`] type for tier operations.
pub type Result<T> = std::result::Result<T, Error>;
