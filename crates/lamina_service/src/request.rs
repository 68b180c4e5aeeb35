// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use bytes::Bytes;
use lamina_tier::{ContentKey, Fingerprint, Scope};

/// A read of one cache key, optionally conditional.
///
/// When `if_none_match` carries a fingerprint from a previous read and the
/// current content still matches, the response is
/// [`CacheStatus::NotModified`](crate::CacheStatus::NotModified) with no
/// payload.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// The key to read.
    pub key: ContentKey,
    /// A previously seen fingerprint, the conditional-header equivalent of
    /// `If-None-Match`.
    pub if_none_match: Option<Fingerprint>,
}

impl ReadRequest {
    /// Creates an unconditional read.
    #[must_use]
    pub fn new(key: ContentKey) -> Self {
        Self { key, if_none_match: None }
    }

    /// Attaches a previously seen fingerprint.
    #[must_use]
    pub fn if_none_match(mut self, fingerprint: Fingerprint) -> Self {
        self.if_none_match = Some(fingerprint);
        self
    }
}

/// A mutation of one origin resource.
///
/// The write endpoint commits this to the origin store, then applies the
/// derived invalidation directive to both server tiers before reporting
/// success.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// The origin resource being mutated.
    pub resource: String,
    /// The scope the resource lives in after the mutation.
    pub scope: Scope,
    /// The new value.
    pub value: Bytes,
    /// Set when the mutation changes shared-vs-scoped visibility (a publish
    /// or unpublish transition); keys in *both* scopes are then invalidated.
    pub visibility_changed: bool,
}

impl WriteRequest {
    /// Creates a write that keeps the resource in its current scope.
    pub fn new(resource: impl Into<String>, scope: Scope, value: Bytes) -> Self {
        Self {
            resource: resource.into(),
            scope,
            value,
            visibility_changed: false,
        }
    }

    /// Marks this write as a visibility transition.
    #[must_use]
    pub fn with_visibility_change(mut self) -> Self {
        self.visibility_changed = true;
        self
    }
}
