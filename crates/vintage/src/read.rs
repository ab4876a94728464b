// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache-aside read orchestrator.

use std::time::Duration;

use serde::Serialize;
use vintage_kv::KeyValueStore;

use crate::{
    blob::{BlobCache, Lookup},
    jitter::jittered_ttl,
    key::{Param, versioned_key},
    version::VersionStore,
};

const DEFAULT_FRESH_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_NOT_FOUND_TTL: Duration = Duration::from_secs(30);
const DEFAULT_JITTER_FRACTION: f64 = 0.2;

/// Result of a versioned cached read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Served from the cache: the serialized payload written by an earlier
    /// read of the same generation.
    Cached(Vec<u8>),
    /// Recomputed from the source of truth this time (and cached for the
    /// next read, best-effort). The caller serializes it for its own wire
    /// format, so a skipped cache write never affects the response.
    Fresh(T),
    /// The resource does not exist upstream — either just confirmed, or
    /// remembered by a negative entry.
    NotFound,
}

/// Builder for [`ReadCache`].
#[derive(Debug)]
pub struct ReadCacheBuilder<S> {
    store: S,
    prefix: String,
    domain: String,
    namespace: String,
    fresh_ttl: Duration,
    not_found_ttl: Duration,
    jitter_fraction: f64,
}

impl<S: KeyValueStore + Clone> ReadCacheBuilder<S> {
    fn new(store: S, prefix: &str, domain: &str, namespace: &str) -> Self {
        Self {
            store,
            prefix: prefix.to_owned(),
            domain: domain.to_owned(),
            namespace: namespace.to_owned(),
            fresh_ttl: DEFAULT_FRESH_TTL,
            not_found_ttl: DEFAULT_NOT_FOUND_TTL,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
        }
    }

    /// TTL for payload entries (default 5 minutes).
    #[must_use]
    pub fn fresh_ttl(mut self, ttl: Duration) -> Self {
        self.fresh_ttl = ttl;
        self
    }

    /// TTL for negative entries (default 30 seconds). This bounds how long a
    /// just-published resource can still read as absent, so keep it short.
    #[must_use]
    pub fn not_found_ttl(mut self, ttl: Duration) -> Self {
        self.not_found_ttl = ttl;
        self
    }

    /// Maximum TTL jitter as a fraction of the base TTL (default 0.2).
    #[must_use]
    pub fn jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    /// Builds the orchestrator.
    #[must_use]
    pub fn build(self) -> ReadCache<S> {
        ReadCache {
            versions: VersionStore::new(self.store.clone(), &self.prefix, &self.domain),
            blobs: BlobCache::new(self.store),
            prefix: self.prefix,
            namespace: self.namespace,
            fresh_ttl: self.fresh_ttl,
            not_found_ttl: self.not_found_ttl,
            jitter_fraction: self.jitter_fraction,
        }
    }
}

/// The cache-aside orchestrator for one read endpoint.
///
/// Composes a [`VersionStore`], a [`BlobCache`], and a caller-supplied
/// recompute callback: a read resolves the domain's current version, builds
/// the versioned key for its parameters, and serves from cache when it can —
/// falling back to the callback and repopulating the cache when it cannot.
/// Writes on the admin path invalidate by calling
/// [`bump_version`](Self::bump_version); stale entries are abandoned in
/// place, never deleted.
///
/// # Consistency
///
/// The store mutation and the version bump are two independent best-effort
/// operations with no transaction spanning them. A crash or a dead backend
/// between the two leaves stale entries readable for at most the configured
/// fresh TTL. That bound is the design's consistency guarantee; under a total
/// backend outage behavior is identical to having no cache at all, at higher
/// latency.
///
/// # Examples
///
/// ```
/// use vintage::{Outcome, Param, ReadCache};
/// use vintage_kv::testing::MockStore;
/// # futures::executor::block_on(async {
///
/// let reads = ReadCache::builder(MockStore::new(), "shop", "catalog", "catalog:list").build();
///
/// let params = [Param::text("season", "ss25")];
/// let outcome = reads
///     .read(&params, || async { Ok::<_, std::io::Error>(Some(vec!["gown-1"])) })
///     .await?;
/// assert!(matches!(outcome, Outcome::Fresh(_)));
///
/// // Same generation, same params: served from cache without recompute.
/// let outcome = reads
///     .read(&params, || async { Ok::<_, std::io::Error>(Some(vec!["never-called"])) })
///     .await?;
/// assert!(matches!(outcome, Outcome::Cached(_)));
/// # Ok::<(), std::io::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct ReadCache<S> {
    versions: VersionStore<S>,
    blobs: BlobCache<S>,
    prefix: String,
    namespace: String,
    fresh_ttl: Duration,
    not_found_ttl: Duration,
    jitter_fraction: f64,
}

impl<S: KeyValueStore + Clone> ReadCache<S> {
    /// Creates a builder for an endpoint's orchestrator.
    ///
    /// `prefix` isolates the keyspace (one per application), `domain` names
    /// the invalidation scope shared by related endpoints ("catalog",
    /// "content"), and `namespace` names this endpoint's keys within it
    /// ("catalog:list", "catalog:get").
    #[must_use]
    pub fn builder(store: S, prefix: &str, domain: &str, namespace: &str) -> ReadCacheBuilder<S> {
        ReadCacheBuilder::new(store, prefix, domain, namespace)
    }
}

impl<S: KeyValueStore> ReadCache<S> {
    /// Returns the domain's current version.
    pub async fn version(&self) -> u64 {
        self.versions.get().await
    }

    /// Bumps the domain's version, abandoning every cached entry of the
    /// current generation. Called by the write path when a mutation changes
    /// a publicly visible fact — and only then; an edit invisible to public
    /// reads should not discard a warm cache.
    pub async fn bump_version(&self) -> u64 {
        self.versions.bump().await
    }

    /// Performs one cache-aside read.
    ///
    /// `fetch` queries the source of truth: `Ok(Some(value))` for a found
    /// resource, `Ok(None)` for confirmed-absent (which is negatively cached
    /// under a short TTL). It is invoked only on a cache miss.
    ///
    /// The cache write is best-effort: TTLs are jittered per key, and a
    /// serialization failure skips the write without affecting the returned
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns the fetch callback's error unchanged. Backend failures never
    /// surface here; they degrade to a miss-and-recompute.
    pub async fn read<T, E, F, Fut>(&self, params: &[Param], fetch: F) -> Result<Outcome<T>, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let version = self.versions.get().await;
        let key = versioned_key(&self.prefix, &self.namespace, version, params);

        match self.blobs.get(&key).await {
            Lookup::Hit(payload) => return Ok(Outcome::Cached(payload)),
            Lookup::ConfirmedAbsent => return Ok(Outcome::NotFound),
            Lookup::Miss => {}
        }

        let Some(value) = fetch().await? else {
            let ttl = jittered_ttl(self.not_found_ttl, &key, self.jitter_fraction);
            self.blobs.set_negative(&key, ttl).await;
            return Ok(Outcome::NotFound);
        };

        match serde_json::to_vec(&value) {
            Ok(payload) => {
                let ttl = jittered_ttl(self.fresh_ttl, &key, self.jitter_fraction);
                self.blobs.set(&key, &payload, ttl).await;
            }
            Err(error) => {
                tracing::debug!(key = %key, %error, "payload serialization failed; cache write skipped");
            }
        }
        Ok(Outcome::Fresh(value))
    }
}
