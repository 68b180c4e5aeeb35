// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! The per-namespace cache policy table.

use std::collections::HashMap;
use std::time::Duration;

use lamina_tier::Scope;

use crate::{Error, Result};

/// How a namespace's cached values are produced from the origin store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// One value per resource id, fetched directly.
    Detail,
    /// An aggregate view whose membership is computed by the origin; cached
    /// pages cannot be invalidated by resource id, only by prefix.
    List,
}

/// The caching policy for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePolicy {
    kind: ContentKind,
    shared_ttl: Duration,
    scoped_ttl: Duration,
}

impl NamespacePolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(kind: ContentKind, shared_ttl: Duration, scoped_ttl: Duration) -> Self {
        Self {
            kind,
            shared_ttl,
            scoped_ttl,
        }
    }

    /// Creates a detail policy.
    #[must_use]
    pub fn detail(shared_ttl: Duration, scoped_ttl: Duration) -> Self {
        Self::new(ContentKind::Detail, shared_ttl, scoped_ttl)
    }

    /// Creates a list policy.
    #[must_use]
    pub fn list(shared_ttl: Duration, scoped_ttl: Duration) -> Self {
        Self::new(ContentKind::List, shared_ttl, scoped_ttl)
    }

    /// Returns the content kind.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Returns the TTL applied to entries in the given scope.
    ///
    /// Shared entries tolerate long TTLs because writes evict them
    /// synchronously; scoped entries are kept short since their blast radius
    /// on a missed invalidation is a single identity seeing its own stale
    /// view for longer.
    #[must_use]
    pub fn ttl_for(&self, scope: &Scope) -> Duration {
        if scope.is_shared() { self.shared_ttl } else { self.scoped_ttl }
    }
}

/// An error constructing a [`CachePolicies`] table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PolicyError {
    /// The same namespace was declared twice.
    #[error("namespace `{namespace}` is declared twice")]
    DuplicateNamespace {
        /// The offending namespace.
        namespace: String,
    },

    /// A namespace declared a zero TTL.
    #[error("namespace `{namespace}` has a zero TTL")]
    ZeroTtl {
        /// The offending namespace.
        namespace: String,
    },

    /// No namespaces were declared.
    #[error("policy table declares no namespaces")]
    Empty,
}

/// The namespace-to-policy table, validated at construction.
///
/// Every namespace the cache serves must be declared up front; a read
/// against an undeclared namespace is rejected rather than cached with
/// made-up defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use lamina::{CachePolicies, NamespacePolicy};
///
/// let policies = CachePolicies::builder()
///     .namespace("detail", NamespacePolicy::detail(Duration::from_secs(2700), Duration::from_secs(180)))
///     .namespace("list", NamespacePolicy::list(Duration::from_secs(600), Duration::from_secs(180)))
///     .build()?;
/// # Ok::<(), lamina::PolicyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CachePolicies {
    table: HashMap<String, NamespacePolicy>,
}

impl CachePolicies {
    /// Starts building a policy table.
    #[must_use]
    pub fn builder() -> CachePoliciesBuilder {
        CachePoliciesBuilder::default()
    }

    /// Creates the default table for content serving: a `detail` namespace
    /// with a 45-minute shared TTL and a `list` namespace with a 10-minute
    /// shared TTL, both with 3-minute scoped TTLs.
    #[must_use]
    pub fn content_defaults() -> Self {
        let mut table = HashMap::new();
        let _ = table.insert(
            "detail".to_owned(),
            NamespacePolicy::detail(Duration::from_secs(45 * 60), Duration::from_secs(3 * 60)),
        );
        let _ = table.insert(
            "list".to_owned(),
            NamespacePolicy::list(Duration::from_secs(10 * 60), Duration::from_secs(3 * 60)),
        );
        Self { table }
    }

    /// Looks up the policy for a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if the namespace is not declared.
    pub fn policy(&self, namespace: &str) -> Result<&NamespacePolicy> {
        self.table
            .get(namespace)
            .ok_or_else(|| Error::unknown_namespace(namespace))
    }

    /// Iterates the declared namespaces of one kind.
    pub(crate) fn namespaces_of_kind(&self, kind: ContentKind) -> impl Iterator<Item = &str> {
        self.table
            .iter()
            .filter(move |(_, policy)| policy.kind() == kind)
            .map(|(namespace, _)| namespace.as_str())
    }
}

/// Builder for [`CachePolicies`].
#[derive(Debug, Default)]
pub struct CachePoliciesBuilder {
    entries: Vec<(String, NamespacePolicy)>,
}

impl CachePoliciesBuilder {
    /// Declares a namespace.
    #[must_use]
    pub fn namespace(mut self, name: impl Into<String>, policy: NamespacePolicy) -> Self {
        self.entries.push((name.into(), policy));
        self
    }

    /// Validates the declarations and builds the table.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] for an empty table, a duplicate namespace,
    /// or a zero TTL.
    pub fn build(self) -> std::result::Result<CachePolicies, PolicyError> {
        if self.entries.is_empty() {
            return Err(PolicyError::Empty);
        }

        let mut table = HashMap::with_capacity(self.entries.len());
        for (namespace, policy) in self.entries {
            if policy.shared_ttl.is_zero() || policy.scoped_ttl.is_zero() {
                return Err(PolicyError::ZeroTtl { namespace });
            }
            if table.insert(namespace.clone(), policy).is_some() {
                return Err(PolicyError::DuplicateNamespace { namespace });
            }
        }
        Ok(CachePolicies { table })
    }
}
