// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for key-value backends.
//!
//! [`KeyValueStore`] defines the interface the caching layer builds on. The
//! design never deletes keys and never needs compare-and-set: versioned keys
//! make stale entries unreachable, and the only mutual-exclusion primitive
//! required is the backend's atomic increment.

use std::time::Duration;

use crate::Result;

/// Trait for key-value backend implementations.
///
/// Implement this trait to plug in a storage backend. All methods are
/// fallible; the caching layer converts every failure into a degraded
/// "miss"/"absent" outcome rather than propagating it, so implementations
/// should report errors honestly and rely on the layer above for tolerance.
///
/// Implementations must be safe to share across concurrent request handlers.
/// Backends are expected to be cheap to clone (a connection handle or an
/// `Arc` around shared state).
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw bytes stored under `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist or has expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// A `ttl` of `None` stores the value durably; `Some(d)` expires it after
    /// `d`. Callers are responsible for rejecting nonpositive TTLs before
    /// calling — a zero `ttl` is passed through to the backend as-is.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> impl Future<Output = Result<()>> + Send;

    /// Atomically adds `delta` to the integer stored under `key` and returns
    /// the resulting value.
    ///
    /// Creates the key at `delta` if it is absent. The stored representation
    /// is an ASCII-decimal integer (Redis `INCRBY` semantics); incrementing a
    /// value that does not parse as an integer is an error.
    fn incr_by(&self, key: &str, delta: i64) -> impl Future<Output = Result<i64>> + Send;

    /// Returns whether `key` currently exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;
}
