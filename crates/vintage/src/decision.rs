// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Versioned memoization of authorization predicates.

use std::time::Duration;

use vintage_kv::KeyValueStore;

use crate::{
    flag::BoolCache,
    jitter::jittered_ttl,
    key::{Param, versioned_key},
    version::VersionStore,
};

const DEFAULT_DECISION_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_JITTER_FRACTION: f64 = 0.2;

/// An authorization verdict.
///
/// Both the cache-hit and the cache-miss branch of
/// [`DecisionCache::evaluate`] converge on this one tagged result, so
/// post-check handling is written once against the verdict rather than
/// merged control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Access permitted.
    Allow,
    /// Access denied.
    Deny,
}

impl Verdict {
    /// Returns true for [`Verdict::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<bool> for Verdict {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Builder for [`DecisionCache`].
#[derive(Debug)]
pub struct DecisionCacheBuilder<S> {
    store: S,
    prefix: String,
    domain: String,
    namespace: String,
    ttl: Duration,
    jitter_fraction: f64,
}

impl<S: KeyValueStore + Clone> DecisionCacheBuilder<S> {
    fn new(store: S, prefix: &str, domain: &str, namespace: &str) -> Self {
        Self {
            store,
            prefix: prefix.to_owned(),
            domain: domain.to_owned(),
            namespace: namespace.to_owned(),
            ttl: DEFAULT_DECISION_TTL,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
        }
    }

    /// TTL for memoized verdicts (default 15 minutes).
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Maximum TTL jitter as a fraction of the base TTL (default 0.2).
    #[must_use]
    pub fn jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    /// Builds the decision cache.
    #[must_use]
    pub fn build(self) -> DecisionCache<S> {
        DecisionCache {
            versions: VersionStore::new(self.store.clone(), &self.prefix, &self.domain),
            flags: BoolCache::new(self.store),
            prefix: self.prefix,
            namespace: self.namespace,
            ttl: self.ttl,
            jitter_fraction: self.jitter_fraction,
        }
    }
}

/// Memoizes an expensive authorization predicate against a domain version.
///
/// The classic use is asset-access authorization: "is this object key still
/// referenced by a published, non-deleted resource?" is a query against the
/// source of truth on every public asset read. The verdict only changes when
/// publish/unpublish/delete actions change the domain's visible state — and
/// those same actions bump the domain version, so keying verdicts by version
/// invalidates exactly the affected decisions without a targeted delete.
///
/// # Examples
///
/// ```
/// use vintage::{DecisionCache, Verdict};
/// use vintage_kv::testing::MockStore;
/// # futures::executor::block_on(async {
///
/// let decisions =
///     DecisionCache::builder(MockStore::new(), "shop", "catalog", "assets:allow").build();
///
/// let verdict = decisions
///     .evaluate("2025/06/gown-1.jpg", || async { Ok::<_, std::io::Error>(true) })
///     .await?;
/// assert_eq!(verdict, Verdict::Allow);
/// # Ok::<(), std::io::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct DecisionCache<S> {
    versions: VersionStore<S>,
    flags: BoolCache<S>,
    prefix: String,
    namespace: String,
    ttl: Duration,
    jitter_fraction: f64,
}

impl<S: KeyValueStore + Clone> DecisionCache<S> {
    /// Creates a builder for an endpoint's decision cache.
    ///
    /// The `domain` must be the one whose writes change the predicate's
    /// truth value, otherwise verdicts outlive the facts they memoize.
    #[must_use]
    pub fn builder(store: S, prefix: &str, domain: &str, namespace: &str) -> DecisionCacheBuilder<S> {
        DecisionCacheBuilder::new(store, prefix, domain, namespace)
    }
}

impl<S: KeyValueStore> DecisionCache<S> {
    /// Evaluates the predicate for `resource`, memoized under the domain's
    /// current version.
    ///
    /// The resource identifier is normalized like any key parameter (plus a
    /// leading-`/` trim, since object keys commonly arrive both ways). The
    /// predicate is invoked only when no verdict is memoized for the current
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns the predicate's error unchanged. Backend failures degrade to
    /// "unknown" and re-run the predicate.
    pub async fn evaluate<E, F, Fut>(&self, resource: &str, predicate: F) -> Result<Verdict, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        let version = self.versions.get().await;
        let resource = resource.trim().trim_start_matches('/');
        let key = versioned_key(
            &self.prefix,
            &self.namespace,
            version,
            &[Param::text("key", resource)],
        );

        if let Some(allowed) = self.flags.get(&key).await {
            return Ok(Verdict::from(allowed));
        }

        let allowed = predicate().await?;
        let ttl = jittered_ttl(self.ttl, &key, self.jitter_fraction);
        self.flags.set(&key, allowed, ttl).await;
        Ok(Verdict::from(allowed))
    }

    /// Returns the domain's current version.
    pub async fn version(&self) -> u64 {
        self.versions.get().await
    }
}
