// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! The versioned on-disk record format for persisted entries.
//!
//! Entries survive process restarts, so the format is explicit about its
//! schema version: a record written by a different release is discarded
//! rather than reinterpreted. Payloads above a size threshold are
//! zstd-compressed, and only kept compressed when that actually saves space.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use lamina_tier::{CacheEntry, Fingerprint};
use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;

/// Payloads below this size are stored uncompressed; the zstd frame overhead
/// is not worth it.
const COMPRESSION_THRESHOLD: usize = 512;

const COMPRESSION_LEVEL: i32 = 3;

/// An error encoding or decoding a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The record bytes could not be interpreted.
    #[error("record is malformed: {reason}")]
    Malformed {
        /// Human-readable cause.
        reason: String,
    },

    /// The record was written under a different schema.
    #[error("record schema version {found}, expected {SCHEMA_VERSION}")]
    SchemaVersion {
        /// The version found in the record.
        found: u32,
    },
}

impl RecordError {
    fn malformed(reason: impl ToString) -> Self {
        Self::Malformed {
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    schema_version: u32,
    fingerprint: Fingerprint,
    inserted_at: Option<SystemTime>,
    ttl: Option<Duration>,
    compressed: bool,
    payload: Vec<u8>,
}

/// Encodes an entry into record bytes.
///
/// # Errors
///
/// Returns [`RecordError::Malformed`] if serialization fails.
pub fn encode(entry: &CacheEntry<Bytes>) -> Result<Vec<u8>, RecordError> {
    let raw = entry.value();
    let mut compressed = false;
    let mut payload = raw.to_vec();

    if raw.len() >= COMPRESSION_THRESHOLD {
        let packed = zstd::encode_all(&raw[..], COMPRESSION_LEVEL).map_err(RecordError::malformed)?;
        if packed.len() < raw.len() {
            compressed = true;
            payload = packed;
        }
    }

    let record = Record {
        schema_version: SCHEMA_VERSION,
        fingerprint: entry.fingerprint().clone(),
        inserted_at: entry.inserted_at(),
        ttl: entry.ttl(),
        compressed,
        payload,
    };
    bincode::serialize(&record).map_err(RecordError::malformed)
}

/// Decodes record bytes back into an entry, preserving its original
/// insertion timestamp.
///
/// # Errors
///
/// Returns [`RecordError::SchemaVersion`] for a record written under another
/// schema and [`RecordError::Malformed`] for bytes that cannot be decoded.
pub fn decode(bytes: &[u8]) -> Result<CacheEntry<Bytes>, RecordError> {
    let record: Record = bincode::deserialize(bytes).map_err(RecordError::malformed)?;
    if record.schema_version != SCHEMA_VERSION {
        return Err(RecordError::SchemaVersion {
            found: record.schema_version,
        });
    }

    let payload = if record.compressed {
        Bytes::from(zstd::decode_all(&record.payload[..]).map_err(RecordError::malformed)?)
    } else {
        Bytes::from(record.payload)
    };

    let mut entry = CacheEntry::new(payload, record.fingerprint);
    if let Some(ttl) = record.ttl {
        entry = entry.with_ttl(ttl);
    }
    if let Some(inserted_at) = record.inserted_at {
        entry.set_inserted_at(inserted_at);
    }
    Ok(entry)
}
