// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! In-memory cache tier for the lamina content cache.
//!
//! [`InMemoryTier`] backs both the shared and the scoped server-side tiers.
//! It checks TTLs lazily at read time against an injected clock. There is no
//! background sweeper, and tests drive expiry with a controlled clock instead
//! of sleeping.

mod stats;
mod tier;

pub use stats::TierStats;
pub use tier::InMemoryTier;
