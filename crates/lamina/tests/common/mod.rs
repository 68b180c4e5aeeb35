// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! A controllable in-memory origin store shared by the integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::collections::BTreeMap;
use std::future::pending;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use bytes::Bytes;
use lamina::{CachePolicies, ContentCache, ListSelector, OriginError, OriginStore};
use lamina_clock::ClockControl;
use lamina_memory::InMemoryTier;
use parking_lot::Mutex;

/// An origin that can be seeded, taken offline, and made to interleave with
/// concurrent readers. Fetch counters record attempts, not successes.
#[derive(Debug, Default)]
pub struct TestOrigin {
    resources: Mutex<BTreeMap<String, Bytes>>,
    unavailable: AtomicBool,
    hang_next_get: AtomicBool,
    yield_on_fetch: AtomicBool,
    gets: AtomicUsize,
    lists: AtomicUsize,
}

impl TestOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, id: &str, value: &'static [u8]) {
        let _ = self.resources.lock().insert(id.to_owned(), Bytes::from_static(value));
    }

    pub fn remove(&self, id: &str) {
        let _ = self.resources.lock().remove(id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next `get` park forever; later calls proceed normally.
    pub fn hang_next_get(&self) {
        self.hang_next_get.store(true, Ordering::SeqCst);
    }

    /// Makes fetches yield once before answering, so concurrent readers
    /// interleave deterministically under a single-threaded executor.
    pub fn yield_on_fetch(&self) {
        self.yield_on_fetch.store(true, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    async fn checkpoint(&self) -> Result<(), OriginError> {
        if self.yield_on_fetch.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OriginError::new("origin offline"));
        }
        Ok(())
    }
}

impl OriginStore for TestOrigin {
    async fn get(&self, id: &str) -> Result<Option<Bytes>, OriginError> {
        if self.hang_next_get.swap(false, Ordering::SeqCst) {
            pending::<()>().await;
        }
        let _ = self.gets.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await?;
        Ok(self.resources.lock().get(id).cloned())
    }

    async fn list(&self, _selector: &ListSelector) -> Result<Vec<Bytes>, OriginError> {
        let _ = self.lists.fetch_add(1, Ordering::SeqCst);
        self.checkpoint().await?;
        // Membership for tests: every seeded resource, in id order.
        Ok(self.resources.lock().values().cloned().collect())
    }

    async fn put(&self, id: &str, value: Bytes) -> Result<Bytes, OriginError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OriginError::new("origin offline"));
        }
        let _ = self.resources.lock().insert(id.to_owned(), value.clone());
        Ok(value)
    }
}

pub type TestCache = ContentCache<Arc<TestOrigin>, InMemoryTier<Bytes>, InMemoryTier<Bytes>>;

/// A fully wired cache over [`TestOrigin`] with a controlled clock and
/// handles to both tiers.
pub struct Fixture {
    pub origin: Arc<TestOrigin>,
    pub clock: ClockControl,
    pub shared: InMemoryTier<Bytes>,
    pub scoped: InMemoryTier<Bytes>,
    pub cache: TestCache,
}

fn init_tracing() {
    static TRACING: Once = Once::new();
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn fixture() -> Fixture {
    init_tracing();
    let origin = Arc::new(TestOrigin::new());
    let control = ClockControl::new();
    let clock = control.to_clock();
    let shared = InMemoryTier::new(clock.clone());
    let scoped = InMemoryTier::new(clock.clone());
    let cache = ContentCache::builder(
        Arc::clone(&origin),
        shared.clone(),
        scoped.clone(),
        CachePolicies::content_defaults(),
    )
    .clock(clock)
    .build();

    Fixture {
        origin,
        clock: control,
        shared,
        scoped,
        cache,
    }
}
