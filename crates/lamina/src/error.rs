// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Error types for cache read and write operations.

use crate::origin::OriginError;

/// An error from a cache read or write.
///
/// The type is `Clone` so that a single failed origin fetch can be shared
/// with every coalesced waiter.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested key's namespace has no entry in the policy table.
    #[error("namespace `{namespace}` has no cache policy")]
    UnknownNamespace {
        /// The namespace that was requested.
        namespace: String,
    },

    /// The origin store has no such resource.
    #[error("resource `{resource}` does not exist in the origin store")]
    NotFound {
        /// The resource id that was requested.
        resource: String,
    },

    /// The origin store could not serve the request.
    #[error(transparent)]
    Origin(#[from] OriginError),

    /// A cache tier failed in a way the read path could not absorb.
    #[error(transparent)]
    Tier(#[from] lamina_tier::Error),
}

impl Error {
    /// Creates an [`Error::UnknownNamespace`].
    pub fn unknown_namespace(namespace: impl Into<String>) -> Self {
        Self::UnknownNamespace {
            namespace: namespace.into(),
        }
    }

    /// Creates an [`Error::NotFound`].
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
