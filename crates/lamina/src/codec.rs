// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Framing for cached list payloads.
//!
//! The origin reports list membership as individual values; a cache entry
//! stores exactly one payload. Lists are framed as a length-prefixed
//! sequence so a whole page round-trips as a single opaque blob, and the
//! fingerprint is computed over the frame, making it sensitive to member
//! order as well as content.
//!
//! Frame layout, all integers big-endian `u32`:
//!
//! ```text
//! count | len(0) item(0) | len(1) item(1) | ...
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// An error decoding a framed list payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The payload ends before the declared items do.
    #[error("list frame ends mid-record")]
    Truncated,

    /// Bytes remain after the declared items.
    #[error("list frame has trailing bytes")]
    TrailingBytes,
}

/// Encodes list membership into a single cacheable payload.
#[must_use]
pub fn encode_list(items: &[Bytes]) -> Bytes {
    let body: usize = items.iter().map(|item| 4 + item.len()).sum();
    let mut buf = BytesMut::with_capacity(4 + body);
    buf.put_u32(items.len() as u32);
    for item in items {
        buf.put_u32(item.len() as u32);
        buf.put_slice(item);
    }
    buf.freeze()
}

/// Decodes a framed list payload back into its members.
///
/// # Errors
///
/// Returns a [`FrameError`] if the payload is truncated or carries trailing
/// bytes. Member slices share the input's allocation.
pub fn decode_list(mut payload: Bytes) -> Result<Vec<Bytes>, FrameError> {
    if payload.remaining() < 4 {
        return Err(FrameError::Truncated);
    }
    let count = payload.get_u32() as usize;

    // The declared count is untrusted; cap the up-front reservation.
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        if payload.remaining() < 4 {
            return Err(FrameError::Truncated);
        }
        let len = payload.get_u32() as usize;
        if payload.remaining() < len {
            return Err(FrameError::Truncated);
        }
        items.push(payload.split_to(len));
    }

    if payload.has_remaining() {
        return Err(FrameError::TrailingBytes);
    }
    Ok(items)
}
