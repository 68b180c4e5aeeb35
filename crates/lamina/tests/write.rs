// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Write-path behavior: commit ordering, derived invalidation, reporting.

mod common;

use bytes::Bytes;
use lamina::{
    CachePolicies, CacheStatus, CacheTier, ContentCache, ContentKey, Error, ReadRequest, Scope,
    WriteRequest,
};
use lamina_clock::Clock;
use lamina_tier::testing::{MockTier, TierOp};
use pretty_assertions::assert_eq;

use crate::common::fixture;

fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn write_is_visible_to_the_next_read() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");
        let request = ReadRequest::new(ContentKey::shared("detail", "story-42"));

        let before = fx.cache.read(&request).await?;
        assert_eq!(before.payload, Some(Bytes::from_static(b"v1")));

        let outcome = fx
            .cache
            .write(&WriteRequest::new("story-42", Scope::Shared, Bytes::from_static(b"v2")))
            .await?;
        assert_eq!(outcome.value, Bytes::from_static(b"v2"));
        assert!(outcome.invalidation.is_complete());
        assert!(outcome.invalidation.evicted >= 1);

        let after = fx.cache.read(&request).await?;
        assert_eq!(after.status, CacheStatus::Miss);
        assert_eq!(after.payload, Some(Bytes::from_static(b"v2")));
        assert_ne!(after.fingerprint, before.fingerprint);
        Ok(())
    })
}

#[test]
fn rejected_commit_invalidates_nothing() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");
        let request = ReadRequest::new(ContentKey::shared("detail", "story-42"));

        let _ = fx.cache.read(&request).await?;
        fx.origin.set_unavailable(true);

        let result = fx
            .cache
            .write(&WriteRequest::new("story-42", Scope::Shared, Bytes::from_static(b"v2")))
            .await;
        assert!(matches!(result, Err(Error::Origin(_))));

        // The cached entry was not touched and still serves the old value.
        let cached = fx.cache.read(&request).await?;
        assert_eq!(cached.status, CacheStatus::Hit);
        assert_eq!(cached.payload, Some(Bytes::from_static(b"v1")));
        Ok(())
    })
}

#[test]
fn scoped_write_preserves_other_identities() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");

        let alice = ReadRequest::new(ContentKey::scoped("list", "alice", "drafts"));
        let bob = ReadRequest::new(ContentKey::scoped("list", "bob", "drafts"));
        let _ = fx.cache.read(&alice).await?;
        let _ = fx.cache.read(&bob).await?;
        assert_eq!(fx.scoped.len(), Some(2));

        let _ = fx
            .cache
            .write(&WriteRequest::new(
                "story-42",
                Scope::identity("alice"),
                Bytes::from_static(b"v2"),
            ))
            .await?;

        // Alice's list view was evicted; Bob's is untouched.
        assert_eq!(fx.cache.read(&bob).await?.status, CacheStatus::Hit);
        assert_eq!(fx.cache.read(&alice).await?.status, CacheStatus::Miss);
        Ok(())
    })
}

#[test]
fn scoped_write_leaves_shared_entries_alone() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");

        let shared = ReadRequest::new(ContentKey::shared("detail", "story-42"));
        let _ = fx.cache.read(&shared).await?;

        let _ = fx
            .cache
            .write(&WriteRequest::new(
                "story-42",
                Scope::identity("alice"),
                Bytes::from_static(b"v2"),
            ))
            .await?;

        // A draft edit visible only to Alice does not evict the shared copy.
        assert_eq!(fx.cache.read(&shared).await?.status, CacheStatus::Hit);
        Ok(())
    })
}

#[test]
fn visibility_transition_evicts_both_scopes() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");

        let shared = ReadRequest::new(ContentKey::shared("detail", "story-42"));
        let scoped = ReadRequest::new(ContentKey::scoped("detail", "alice", "story-42"));
        let _ = fx.cache.read(&shared).await?;
        let _ = fx.cache.read(&scoped).await?;

        // Publish: the resource moves from Alice's drafts to shared view.
        let outcome = fx
            .cache
            .write(
                &WriteRequest::new("story-42", Scope::Shared, Bytes::from_static(b"v2")).with_visibility_change(),
            )
            .await?;
        assert!(outcome.invalidation.evicted >= 2);

        assert_eq!(fx.cache.read(&shared).await?.status, CacheStatus::Miss);
        assert_eq!(fx.cache.read(&scoped).await?.status, CacheStatus::Miss);
        Ok(())
    })
}

#[test]
fn write_evicts_every_cached_list_page() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");

        let page_1 = ReadRequest::new(ContentKey::shared("list", "featured").with_sub_resource("page-1"));
        let page_2 = ReadRequest::new(ContentKey::shared("list", "featured").with_sub_resource("page-2"));
        let _ = fx.cache.read(&page_1).await?;
        let _ = fx.cache.read(&page_2).await?;

        let _ = fx
            .cache
            .write(&WriteRequest::new("story-43", Scope::Shared, Bytes::from_static(b"new")))
            .await?;

        // List membership cannot be derived from the resource id, so every
        // page goes.
        assert_eq!(fx.cache.read(&page_1).await?.status, CacheStatus::Miss);
        assert_eq!(fx.cache.read(&page_2).await?.status, CacheStatus::Miss);
        Ok(())
    })
}

#[test]
fn failed_eviction_is_reported_not_retried() -> Result<(), Error> {
    block_on(async {
        let origin = std::sync::Arc::new(common::TestOrigin::new());
        origin.seed("story-42", b"v1");

        let shared: MockTier<Bytes> = MockTier::new();
        let scoped: MockTier<Bytes> = MockTier::new();
        let cache = ContentCache::builder(
            std::sync::Arc::clone(&origin),
            shared.clone(),
            scoped.clone(),
            CachePolicies::content_defaults(),
        )
        .clock(Clock::new_frozen())
        .build();

        let _ = cache.read(&ReadRequest::new(ContentKey::shared("detail", "story-42"))).await?;
        shared.fail_when(|op| matches!(op, TierOp::Evict(_)));

        // The write itself still succeeds; the incomplete invalidation is
        // surfaced in the outcome.
        let outcome = cache
            .write(&WriteRequest::new("story-42", Scope::Shared, Bytes::from_static(b"v2")))
            .await?;
        assert!(!outcome.invalidation.is_complete());
        assert_eq!(outcome.invalidation.failed.len(), 2);

        // The stale entry remains until its TTL bounds the damage.
        shared.fail_never();
        let stale = cache.read(&ReadRequest::new(ContentKey::shared("detail", "story-42"))).await?;
        assert_eq!(stale.payload, Some(Bytes::from_static(b"v1")));
        Ok(())
    })
}

#[test]
fn directives_only_touch_matching_namespaces() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");
        fx.origin.seed("story-7", b"other");

        let other = ReadRequest::new(ContentKey::shared("detail", "story-7"));
        let _ = fx.cache.read(&other).await?;

        let _ = fx
            .cache
            .write(&WriteRequest::new("story-42", Scope::Shared, Bytes::from_static(b"v2")))
            .await?;

        // A different detail resource is untouched by the directive.
        assert_eq!(fx.cache.read(&other).await?.status, CacheStatus::Hit);
        Ok(())
    })
}

#[test]
fn fixture_tiers_share_state_with_the_cache() -> Result<(), Error> {
    block_on(async {
        let fx = fixture();
        fx.origin.seed("story-42", b"v1");
        let _ = fx.cache.read(&ReadRequest::new(ContentKey::shared("detail", "story-42"))).await?;

        assert_eq!(fx.shared.len(), Some(1));
        assert_eq!(fx.shared.stats().hits, 0);
        assert_eq!(fx.shared.stats().misses, 1);
        Ok(())
    })
}
