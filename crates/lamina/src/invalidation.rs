// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Deriving and applying invalidation directives.
//!
//! Every committed mutation produces a directive: the set of key patterns
//! whose cached entries can no longer be trusted. The planner cannot know
//! which list views include a mutated resource, so list namespaces are
//! evicted by prefix; that over-invalidates but never under-invalidates.

use bytes::Bytes;
use lamina_service::{InvalidationReport, WriteRequest};
use lamina_tier::{CacheTier, KeyPattern, Scope};
use tracing::{Level, event};

use crate::policy::{CachePolicies, ContentKind};

/// A committed origin mutation, as seen by the invalidation planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// The mutated resource id.
    pub resource: String,
    /// The scope the resource lives in after the mutation.
    pub scope: Scope,
    /// Whether the mutation changed shared-vs-scoped visibility.
    pub visibility_changed: bool,
}

impl Mutation {
    /// Extracts the mutation from a write request.
    #[must_use]
    pub fn of(request: &WriteRequest) -> Self {
        Self {
            resource: request.resource.clone(),
            scope: request.scope.clone(),
            visibility_changed: request.visibility_changed,
        }
    }
}

/// The set of key patterns a mutation requires evicting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationDirective {
    patterns: Vec<KeyPattern>,
}

impl InvalidationDirective {
    /// Plans the directive for a mutation.
    ///
    /// Detail namespaces are evicted for the mutated resource (including its
    /// sub-resource entries); list namespaces are evicted whole, since their
    /// membership cannot be computed from the resource id. A visibility
    /// transition widens every pattern to all scopes: the pre-transition
    /// entries live under a scope the request no longer names.
    #[must_use]
    pub fn for_mutation(policies: &CachePolicies, mutation: &Mutation) -> Self {
        let scope = if mutation.visibility_changed {
            None
        } else {
            Some(mutation.scope.clone())
        };

        let mut patterns = Vec::new();
        for namespace in policies.namespaces_of_kind(ContentKind::Detail) {
            patterns.push(KeyPattern::resource_prefix(namespace, scope.clone(), &mutation.resource));
        }
        for namespace in policies.namespaces_of_kind(ContentKind::List) {
            patterns.push(KeyPattern::prefix(namespace, scope.clone()));
        }
        // Stable order, so reports and logs are reproducible.
        patterns.sort_by_key(ToString::to_string);
        Self { patterns }
    }

    /// Returns the planned patterns.
    #[must_use]
    pub fn patterns(&self) -> &[KeyPattern] {
        &self.patterns
    }
}

/// Applies directives to both server tiers, synchronously with the write.
///
/// A pattern that fails on some tier is recorded in the report and logged
/// for operators, not retried: an asynchronous retry could reorder against a
/// later write to the same keys, and the entries age out at their TTL bound
/// regardless.
#[derive(Debug, Clone)]
pub struct InvalidationBus<TS, TP> {
    shared: TS,
    scoped: TP,
}

impl<TS, TP> InvalidationBus<TS, TP>
where
    TS: CacheTier<Bytes>,
    TP: CacheTier<Bytes>,
{
    /// Creates a bus over the two server tiers.
    pub fn new(shared: TS, scoped: TP) -> Self {
        Self { shared, scoped }
    }

    /// Applies every pattern of the directive to both tiers.
    pub async fn apply(&self, directive: &InvalidationDirective) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        for pattern in directive.patterns() {
            let mut failed = false;

            match self.shared.evict(pattern).await {
                Ok(removed) => report.evicted += removed,
                Err(error) => {
                    failed = true;
                    event!(
                        Level::ERROR,
                        pattern = %pattern,
                        error = %error,
                        "shared tier kept entries an invalidation should have removed"
                    );
                }
            }

            match self.scoped.evict(pattern).await {
                Ok(removed) => report.evicted += removed,
                Err(error) => {
                    failed = true;
                    event!(
                        Level::ERROR,
                        pattern = %pattern,
                        error = %error,
                        "scoped tier kept entries an invalidation should have removed"
                    );
                }
            }

            if failed {
                report.failed.push(pattern.clone());
            }
        }
        report
    }
}
