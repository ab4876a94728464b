// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-domain invalidation versions.

use vintage_kv::KeyValueStore;

/// A handle to one invalidation domain's version counter.
///
/// The version tags the "generation" of a domain's publicly visible data.
/// Reads embed it in every cache key; writes bump it whenever a mutation
/// changes a publicly visible fact. Old entries are never deleted — they
/// simply stop being looked up and expire by TTL.
///
/// A missing value is defined as version 0; the first bump (an atomic
/// increment of the missing key) yields 1, which cleanly bypasses every v0
/// key. The version is monotonically non-decreasing for the lifetime of the
/// backend. A backend restart that loses it resets reads to v0, which is
/// safe: entries keyed under the old, higher version become unreachable and
/// expire on their own.
///
/// Handles are explicit (store + prefix + domain) rather than process-wide
/// constants so tests can run isolated keyspaces side by side.
///
/// # Examples
///
/// ```
/// use vintage::VersionStore;
/// use vintage_kv::testing::MockStore;
/// # futures::executor::block_on(async {
///
/// let versions = VersionStore::new(MockStore::new(), "shop", "catalog");
/// assert_eq!(versions.get().await, 0);
/// assert_eq!(versions.bump().await, 1);
/// assert_eq!(versions.get().await, 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct VersionStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> VersionStore<S> {
    /// Creates a handle for `domain` under the given keyspace `prefix`.
    #[must_use]
    pub fn new(store: S, prefix: &str, domain: &str) -> Self {
        Self {
            store,
            key: format!("{prefix}:ver:{domain}"),
        }
    }

    /// Returns the backend key holding this domain's version.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the current version, or 0 when the value is absent,
    /// unparsable, negative, or the backend is unreachable.
    ///
    /// Flooring to 0 is always safe: the worst case is over-invalidation
    /// (reads recompute under v0 keys), never serving stale data.
    pub async fn get(&self) -> u64 {
        match self.store.get(&self.key).await {
            Ok(Some(raw)) => parse_version(&raw),
            Ok(None) => 0,
            Err(error) => {
                tracing::debug!(key = %self.key, %error, "version read failed; treating as 0");
                0
            }
        }
    }

    /// Atomically increments the version and returns the new value.
    ///
    /// Invalidation is best-effort: if the backend is unreachable the bump is
    /// skipped and 0 is returned. Stale entries then remain readable until
    /// their TTL expires, which is the documented staleness bound.
    pub async fn bump(&self) -> u64 {
        match self.store.incr_by(&self.key, 1).await {
            Ok(version) => u64::try_from(version).unwrap_or(0),
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "version bump failed; stale entries expire by ttl");
                0
            }
        }
    }
}

fn parse_version(raw: &[u8]) -> u64 {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.trim().parse::<i64>().ok())
        .and_then(|version| u64::try_from(version).ok())
        .unwrap_or(0)
}
