// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tri-state boolean memoization cache.

use std::time::Duration;

use vintage_kv::KeyValueStore;

/// Best-effort cache for boolean decisions.
///
/// The payload is tri-state: `Some(true)`, `Some(false)`, or `None` for
/// "unknown" — no sentinel value is needed because the absence of the key
/// already carries that meaning. Garbage values and backend failures also
/// read as unknown, sending the caller back to the authoritative check.
#[derive(Debug, Clone)]
pub struct BoolCache<S> {
    store: S,
}

impl<S: KeyValueStore> BoolCache<S> {
    /// Creates a boolean cache over the given backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up the decision memoized under `key`.
    pub async fn get(&self, key: &str) -> Option<bool> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::debug!(key, %error, "bool read failed; treating as unknown");
                return None;
            }
        };
        match std::str::from_utf8(&raw).map(str::trim) {
            Ok(text) if text == "1" || text.eq_ignore_ascii_case("true") => Some(true),
            Ok(text) if text == "0" || text.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Memoizes a decision under `key` for `ttl`. No-op for a zero TTL;
    /// best-effort otherwise.
    pub async fn set(&self, key: &str, value: bool, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let encoded: &[u8] = if value { b"1" } else { b"0" };
        if let Err(error) = self.store.set(key, encoded, Some(ttl)).await {
            tracing::debug!(key, %error, "bool write failed; entry skipped");
        }
    }
}
