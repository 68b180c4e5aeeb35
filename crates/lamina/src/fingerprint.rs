// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use lamina_tier::Fingerprint;
use xxhash_rust::xxh3::xxh3_128;

/// Computes content fingerprints for conditional reads.
///
/// The digest is XXH3-128 rendered as 32 lowercase hex characters. It is a
/// pure function of the payload bytes: two refills that fetch equal content
/// at different times produce equal fingerprints, which is what lets a
/// conditional read answer "not modified" across a TTL expiry. Anything
/// time-dependent (fetch timestamps, entry metadata) must stay out of the
/// fingerprinted bytes.
///
/// This is an integrity check for cache coherence, not an authenticator;
/// collision resistance against an adversary is a non-requirement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter;

impl Fingerprinter {
    /// Creates a fingerprinter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Digests a payload.
    #[must_use]
    pub fn fingerprint(&self, payload: &[u8]) -> Fingerprint {
        Fingerprint::new(format!("{:032x}", xxh3_128(payload)))
    }
}
