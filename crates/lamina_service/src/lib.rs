// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Request and response types for the lamina cache read/write endpoints.
//!
//! These types form the wire-adjacent surface of the cache: a transport
//! layer maps HTTP conditional headers onto [`ReadRequest::if_none_match`]
//! and renders [`CacheStatus`] and the fingerprint back out as response
//! headers. The cache itself never sees a transport.

mod request;
mod response;

pub use request::{ReadRequest, WriteRequest};
pub use response::{CacheStatus, InvalidationReport, ReadResponse, WriteOutcome};
