// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! The origin store abstraction the cache reads through.

use std::sync::Arc;

use bytes::Bytes;
use lamina_tier::{ContentKey, Scope};

/// An error from the origin store.
///
/// Wraps the underlying cause in an `Arc` so one failed fetch can be shared
/// with every coalesced waiter.
#[derive(Debug, Clone, thiserror::Error)]
#[error("origin store unavailable: {reason}")]
pub struct OriginError {
    reason: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl OriginError {
    /// Creates an error with a human-readable cause.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates an error carrying the underlying cause.
    pub fn with_source(reason: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            reason: reason.into(),
            source: Some(Arc::new(source)),
        }
    }
}

/// The list selection derived from a list-namespace key.
///
/// The cache never understands list membership; it forwards the selection to
/// the origin, which computes the current members, and caches the framed
/// result under the original key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSelector {
    scope: Scope,
    name: String,
    page: Option<String>,
}

impl ListSelector {
    /// Derives the selection from a cache key: the resource names the list,
    /// the sub-resource selects a page.
    #[must_use]
    pub fn from_key(key: &ContentKey) -> Self {
        Self {
            scope: key.scope().clone(),
            name: key.resource().to_owned(),
            page: key.sub_resource().map(str::to_owned),
        }
    }

    /// Returns the scope the list is computed for.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the list name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the page discriminator, if the key carried one.
    #[must_use]
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// The authoritative backing store the cache reads through.
///
/// Writes go to the origin first; the cache only observes committed values.
/// `get` distinguishes "no such resource" (`Ok(None)`) from "could not ask"
/// (`Err`): the former is a definitive answer the cache propagates as
/// not-found, the latter triggers the stale-serving degradation path.
pub trait OriginStore: Send + Sync {
    /// Fetches one resource by id, or `None` if it does not exist.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Bytes>, OriginError>> + Send;

    /// Computes the current membership of a list view.
    fn list(&self, selector: &ListSelector) -> impl Future<Output = Result<Vec<Bytes>, OriginError>> + Send;

    /// Commits a new value for a resource, returning the value as stored.
    fn put(&self, id: &str, value: Bytes) -> impl Future<Output = Result<Bytes, OriginError>> + Send;
}

impl<O> OriginStore for Arc<O>
where
    O: OriginStore + ?Sized,
{
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Bytes>, OriginError>> + Send {
        (**self).get(id)
    }

    fn list(&self, selector: &ListSelector) -> impl Future<Output = Result<Vec<Bytes>, OriginError>> + Send {
        (**self).list(selector)
    }

    fn put(&self, id: &str, value: Bytes) -> impl Future<Output = Result<Bytes, OriginError>> + Send {
        (**self).put(id, value)
    }
}
