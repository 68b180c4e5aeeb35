// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::fmt;

/// The visibility partition of a cache key.
///
/// Shared content is globally visible and served to every reader from one
/// entry. Scoped content belongs to a single identity; its entries are
/// addressed per identity and never observed across identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// One entry serves all readers.
    Shared,
    /// One entry per identity.
    Identity(String),
}

impl Scope {
    /// Creates a per-identity scope.
    pub fn identity(id: impl Into<String>) -> Self {
        Self::Identity(id.into())
    }

    /// Returns `true` for the shared scope.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "public"),
            Self::Identity(id) => write!(f, "user:{id}"),
        }
    }
}

/// Addresses one logical cached value.
///
/// A key is the composite of `(namespace, scope, resource, sub_resource?)`.
/// The namespace identifies a content class (for example `"detail"` or
/// `"list"`); the scope partitions visibility; the resource identifies the
/// underlying origin object.
///
/// # Examples
///
/// ```
/// use lamina_tier::{ContentKey, Scope};
///
/// let key = ContentKey::shared("detail", "story-42");
/// assert_eq!(key.to_string(), "detail:public:story-42");
///
/// let key = ContentKey::scoped("list", "alice", "drafts").with_sub_resource("page-1");
/// assert_eq!(key.to_string(), "list:user:alice:drafts:page-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentKey {
    namespace: String,
    scope: Scope,
    resource: String,
    sub_resource: Option<String>,
}

impl ContentKey {
    /// Creates a key in the given scope.
    pub fn new(namespace: impl Into<String>, scope: Scope, resource: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            scope,
            resource: resource.into(),
            sub_resource: None,
        }
    }

    /// Creates a key in the shared scope.
    pub fn shared(namespace: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::new(namespace, Scope::Shared, resource)
    }

    /// Creates a key scoped to one identity.
    pub fn scoped(namespace: impl Into<String>, identity: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::new(namespace, Scope::identity(identity), resource)
    }

    /// Attaches a sub-resource discriminator (for example a page number).
    #[must_use]
    pub fn with_sub_resource(mut self, sub_resource: impl Into<String>) -> Self {
        self.sub_resource = Some(sub_resource.into());
        self
    }

    /// Returns the content-class namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the visibility scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the resource identifier.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the sub-resource discriminator, if any.
    #[must_use]
    pub fn sub_resource(&self) -> Option<&str> {
        self.sub_resource.as_deref()
    }

    /// Returns the same key re-addressed in another scope.
    ///
    /// Used when a visibility transition (publish/unpublish) requires
    /// invalidating the counterpart scope's entry.
    #[must_use]
    pub fn in_scope(&self, scope: Scope) -> Self {
        Self {
            namespace: self.namespace.clone(),
            scope,
            resource: self.resource.clone(),
            sub_resource: self.sub_resource.clone(),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.scope, self.resource)?;
        if let Some(sub) = &self.sub_resource {
            write!(f, ":{sub}")?;
        }
        Ok(())
    }
}

/// Selects keys for eviction: an exact key or a namespace/scope prefix.
///
/// Prefix patterns cover aggregate views whose membership cannot be computed
/// from a single resource id — evicting `list` for a scope removes every
/// cached page of every list in that scope.
///
/// # Examples
///
/// ```
/// use lamina_tier::{ContentKey, KeyPattern, Scope};
///
/// let pattern = KeyPattern::prefix("list", Some(Scope::identity("alice")));
///
/// assert!(pattern.matches(&ContentKey::scoped("list", "alice", "drafts")));
/// assert!(!pattern.matches(&ContentKey::scoped("list", "bob", "drafts")));
/// assert!(!pattern.matches(&ContentKey::scoped("detail", "alice", "drafts")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Matches exactly one key.
    Exact(ContentKey),
    /// Matches every key under a namespace prefix.
    Prefix {
        /// The namespace to match.
        namespace: String,
        /// When set, only keys in this scope match; otherwise all scopes match.
        scope: Option<Scope>,
        /// When set, only keys for this resource match (any sub-resource);
        /// otherwise all resources in the namespace match.
        resource: Option<String>,
    },
}

impl KeyPattern {
    /// Creates an exact-key pattern.
    #[must_use]
    pub fn exact(key: ContentKey) -> Self {
        Self::Exact(key)
    }

    /// Creates a prefix pattern over a namespace, optionally scoped.
    pub fn prefix(namespace: impl Into<String>, scope: Option<Scope>) -> Self {
        Self::Prefix {
            namespace: namespace.into(),
            scope,
            resource: None,
        }
    }

    /// Creates a prefix pattern over one resource in a namespace, covering
    /// the key and all of its sub-resource entries.
    pub fn resource_prefix(namespace: impl Into<String>, scope: Option<Scope>, resource: impl Into<String>) -> Self {
        Self::Prefix {
            namespace: namespace.into(),
            scope,
            resource: Some(resource.into()),
        }
    }

    /// Returns `true` if `key` is covered by this pattern.
    #[must_use]
    pub fn matches(&self, key: &ContentKey) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Prefix { namespace, scope, resource } => {
                key.namespace() == namespace
                    && scope.as_ref().is_none_or(|s| key.scope() == s)
                    && resource.as_deref().is_none_or(|r| key.resource() == r)
            }
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Prefix { namespace, scope, resource } => {
                write!(f, "{namespace}")?;
                match scope {
                    Some(scope) => write!(f, ":{scope}")?,
                    None => write!(f, ":*")?,
                }
                match resource {
                    Some(resource) => write!(f, ":{resource}:*"),
                    None => write!(f, ":*"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keys_with_different_scopes_are_distinct() {
        let shared = ContentKey::shared("detail", "story-42");
        let scoped = ContentKey::scoped("detail", "alice", "story-42");
        assert_ne!(shared, scoped);
    }

    #[test]
    fn display_renders_composite() {
        assert_eq!(ContentKey::shared("detail", "story-42").to_string(), "detail:public:story-42");
        assert_eq!(
            ContentKey::scoped("list", "alice", "drafts").to_string(),
            "list:user:alice:drafts"
        );
    }

    #[test]
    fn in_scope_preserves_everything_but_scope() {
        let key = ContentKey::scoped("detail", "alice", "story-42").with_sub_resource("body");
        let shared = key.in_scope(Scope::Shared);
        assert_eq!(shared.namespace(), "detail");
        assert_eq!(shared.resource(), "story-42");
        assert_eq!(shared.sub_resource(), Some("body"));
        assert!(shared.scope().is_shared());
    }

    #[test]
    fn exact_pattern_matches_only_that_key() {
        let key = ContentKey::shared("detail", "story-42");
        let pattern = KeyPattern::exact(key.clone());
        assert!(pattern.matches(&key));
        assert!(!pattern.matches(&ContentKey::shared("detail", "story-43")));
        assert!(!pattern.matches(&key.clone().with_sub_resource("body")));
    }

    #[test]
    fn unscoped_prefix_matches_all_scopes() {
        let pattern = KeyPattern::prefix("list", None);
        assert!(pattern.matches(&ContentKey::shared("list", "featured")));
        assert!(pattern.matches(&ContentKey::scoped("list", "alice", "drafts")));
        assert!(!pattern.matches(&ContentKey::shared("detail", "story-42")));
    }

    #[test]
    fn resource_prefix_covers_sub_resources() {
        let pattern = KeyPattern::resource_prefix("detail", Some(Scope::Shared), "story-42");
        assert!(pattern.matches(&ContentKey::shared("detail", "story-42")));
        assert!(pattern.matches(&ContentKey::shared("detail", "story-42").with_sub_resource("body")));
        assert!(!pattern.matches(&ContentKey::shared("detail", "story-43")));
        assert!(!pattern.matches(&ContentKey::scoped("detail", "alice", "story-42")));
    }

    #[test]
    fn pattern_display() {
        assert_eq!(KeyPattern::prefix("list", Some(Scope::Shared)).to_string(), "list:public:*");
        assert_eq!(KeyPattern::prefix("list", None).to_string(), "list:*:*");
        assert_eq!(
            KeyPattern::resource_prefix("detail", None, "story-42").to_string(),
            "detail:*:story-42:*"
        );
    }
}
