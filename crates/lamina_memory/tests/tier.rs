// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Integration tests for the in-memory tier.

use std::time::Duration;

use lamina_clock::ClockControl;
use lamina_memory::InMemoryTier;
use lamina_tier::{CacheEntry, CacheTier, ContentKey, Error, Fingerprint, KeyPattern, Lookup, Scope};
use pretty_assertions::assert_eq;

type TestResult = Result<(), Error>;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn entry(value: &str) -> CacheEntry<String> {
    CacheEntry::new(value.to_string(), Fingerprint::new(format!("fp-{value}")))
}

#[test]
fn get_insert_roundtrip() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::new(control.to_clock());
        let key = ContentKey::shared("detail", "story-42");

        assert!(tier.get(&key).await?.is_miss());

        tier.insert(&key, entry("v1")).await?;

        let lookup = tier.get(&key).await?;
        assert_eq!(lookup.entry().map(|e| e.value().as_str()), Some("v1"));
        Ok(())
    })
}

#[test]
fn entry_expires_at_ttl_without_eviction() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::with_default_ttl(control.to_clock(), Duration::from_secs(3600));
        let key = ContentKey::shared("detail", "story-42");

        tier.insert(&key, entry("v1")).await?;
        assert!(tier.get(&key).await?.is_hit());

        control.advance(Duration::from_secs(3600));

        // Past the TTL the read path sees a miss, but the value is still
        // there for stale-serving.
        match tier.get(&key).await? {
            Lookup::Expired(stale) => assert_eq!(stale.value(), "v1"),
            other => panic!("expected expired lookup, got {other:?}"),
        }
        Ok(())
    })
}

#[test]
fn per_entry_ttl_overrides_default() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::with_default_ttl(control.to_clock(), Duration::from_secs(3600));
        let key = ContentKey::shared("detail", "story-42");

        tier.insert(&key, entry("v1").with_ttl(Duration::from_secs(60))).await?;

        control.advance(Duration::from_secs(60));
        assert!(!tier.get(&key).await?.is_hit());
        Ok(())
    })
}

#[test]
fn insert_replaces_whole_entry() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::with_default_ttl(control.to_clock(), Duration::from_secs(100));
        let key = ContentKey::shared("detail", "story-42");

        tier.insert(&key, entry("v1")).await?;
        control.advance(Duration::from_secs(90));

        // The refreshed entry gets a fresh timestamp and fingerprint.
        tier.insert(&key, entry("v2")).await?;
        control.advance(Duration::from_secs(20));

        let lookup = tier.get(&key).await?;
        assert!(lookup.is_hit());
        assert_eq!(lookup.entry().map(|e| e.value().as_str()), Some("v2"));
        assert_eq!(
            lookup.entry().map(|e| e.fingerprint().as_str()),
            Some("fp-v2")
        );
        Ok(())
    })
}

#[test]
fn exact_evict_removes_one_key() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::new(control.to_clock());
        let key_a = ContentKey::shared("detail", "story-42");
        let key_b = ContentKey::shared("detail", "story-43");

        tier.insert(&key_a, entry("a")).await?;
        tier.insert(&key_b, entry("b")).await?;

        let removed = tier.evict(&KeyPattern::exact(key_a.clone())).await?;
        assert_eq!(removed, 1);
        assert!(tier.get(&key_a).await?.is_miss());
        assert!(tier.get(&key_b).await?.is_hit());
        Ok(())
    })
}

#[test]
fn prefix_evict_respects_scope() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::new(control.to_clock());

        let alice = ContentKey::scoped("list", "alice", "drafts");
        let bob = ContentKey::scoped("list", "bob", "drafts");
        let shared = ContentKey::shared("list", "featured");

        tier.insert(&alice, entry("alice")).await?;
        tier.insert(&bob, entry("bob")).await?;
        tier.insert(&shared, entry("featured")).await?;

        let removed = tier
            .evict(&KeyPattern::prefix("list", Some(Scope::identity("alice"))))
            .await?;
        assert_eq!(removed, 1);

        // A mutation to Alice's lists never touches Bob's or the shared entry.
        assert!(tier.get(&alice).await?.is_miss());
        assert!(tier.get(&bob).await?.is_hit());
        assert!(tier.get(&shared).await?.is_hit());
        Ok(())
    })
}

#[test]
fn unscoped_prefix_evicts_all_scopes() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::new(control.to_clock());

        tier.insert(&ContentKey::scoped("list", "alice", "drafts"), entry("a")).await?;
        tier.insert(&ContentKey::shared("list", "featured"), entry("f")).await?;
        tier.insert(&ContentKey::shared("detail", "story-42"), entry("d")).await?;

        let removed = tier.evict(&KeyPattern::prefix("list", None)).await?;
        assert_eq!(removed, 2);
        assert_eq!(tier.len(), Some(1));
        Ok(())
    })
}

#[test]
fn counters_track_hits_misses_and_evictions() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::with_default_ttl(control.to_clock(), Duration::from_secs(60));
        let key = ContentKey::shared("detail", "story-42");

        let _ = tier.get(&key).await?; // miss
        tier.insert(&key, entry("v1")).await?;
        let _ = tier.get(&key).await?; // hit
        control.advance(Duration::from_secs(60));
        let _ = tier.get(&key).await?; // expired counts as miss
        let _ = tier.evict(&KeyPattern::exact(key)).await?;

        let stats = tier.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 1);
        Ok(())
    })
}

#[test]
fn clear_empties_the_tier() -> TestResult {
    block_on(async {
        let control = ClockControl::new();
        let tier = InMemoryTier::new(control.to_clock());

        tier.insert(&ContentKey::shared("detail", "a"), entry("a")).await?;
        tier.insert(&ContentKey::shared("detail", "b"), entry("b")).await?;
        tier.clear().await?;

        assert_eq!(tier.len(), Some(0));
        assert_eq!(tier.is_empty(), Some(true));
        Ok(())
    })
}
