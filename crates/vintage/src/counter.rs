// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Self-healing durable counters.
//!
//! A counter caches one aggregate over the source of truth (say, the number
//! of inbound leads still marked "new") so operational endpoints don't run
//! the aggregate query on every poll. The counter is advisory: the write
//! path nudges it with ±1 deltas, and every way it can go wrong — eviction,
//! a missed delta, a double-counted one — is detected and repaired from the
//! authoritative count instead of audited.

use vintage_kv::KeyValueStore;

/// Which path served a counter read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSource {
    /// The fast path: the value stored in the backend.
    Store,
    /// The slow path: recomputed from the authoritative callback (and written
    /// back as the new baseline).
    Authoritative,
}

/// A handle to one named durable counter.
///
/// Counter operations are fire-and-forget relative to the primary mutation
/// they ride along with: backend failures are swallowed (the next read
/// self-heals), and only the authoritative callback's own error ever
/// propagates, for the caller to log.
///
/// The stored value is durable (no TTL) so it survives restarts of the
/// application; backend eviction is handled by the absent-key reconcile
/// path.
///
/// # Examples
///
/// ```
/// use vintage::{Counter, CounterSource};
/// use vintage_kv::testing::MockStore;
/// # futures::executor::block_on(async {
///
/// let counter = Counter::new(MockStore::new(), "shop", "leads:new");
///
/// // Absent counter: the delta is meaningless without a base, so the
/// // authoritative count wins.
/// counter.apply_delta(1, || async { Ok::<_, std::io::Error>(12) }).await?;
///
/// let (count, source) = counter.read(false, || async { Ok::<_, std::io::Error>(12) }).await?;
/// assert_eq!(count, 12);
/// assert_eq!(source, CounterSource::Store);
/// # Ok::<(), std::io::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Counter<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Counter<S> {
    /// Creates a handle for the counter `name` under the keyspace `prefix`.
    #[must_use]
    pub fn new(store: S, prefix: &str, name: &str) -> Self {
        Self {
            store,
            key: format!("{prefix}:counter:{name}"),
        }
    }

    /// Returns the backend key holding this counter.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrites the counter with a freshly computed authoritative count.
    ///
    /// The write is durable and best-effort; the computed count is returned
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns the authoritative callback's error unchanged.
    pub async fn reconcile<F, Fut, E>(&self, authoritative: F) -> Result<i64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, E>>,
    {
        let count = authoritative().await?;
        self.write_baseline(count).await;
        Ok(count)
    }

    /// Seeds the counter at process start so it is consistent across
    /// restarts. Alias for [`reconcile`](Self::reconcile) with intent in the
    /// name.
    ///
    /// # Errors
    ///
    /// Returns the authoritative callback's error unchanged.
    pub async fn prime<F, Fut, E>(&self, authoritative: F) -> Result<i64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, E>>,
    {
        self.reconcile(authoritative).await
    }

    /// Applies a ±delta as a record transitions into or out of the tracked
    /// state.
    ///
    /// Self-healing kicks in on both suspicious outcomes:
    /// - the counter key is absent (evicted, never primed): the delta is
    ///   meaningless without a base, so the counter is reconciled instead;
    /// - the post-delta value is negative (a missed or double-counted
    ///   delta): the bad value is overwritten from the authoritative count.
    ///
    /// Backend failures are swallowed — the next read falls back to the
    /// authoritative count anyway.
    ///
    /// # Errors
    ///
    /// Returns the authoritative callback's error unchanged, and only when a
    /// reconcile was needed. Callers on the write path should log it and
    /// carry on; the primary mutation has already succeeded.
    pub async fn apply_delta<F, Fut, E>(&self, delta: i64, authoritative: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, E>>,
    {
        if delta == 0 {
            return Ok(());
        }

        match self.store.exists(&self.key).await {
            Ok(true) => {}
            Ok(false) => {
                self.reconcile(authoritative).await?;
                return Ok(());
            }
            Err(error) => {
                tracing::debug!(key = %self.key, %error, "counter probe failed; delta skipped");
                return Ok(());
            }
        }

        match self.store.incr_by(&self.key, delta).await {
            Ok(value) if value < 0 => {
                self.reconcile(authoritative).await?;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(key = %self.key, %error, "counter delta failed; next read reconciles");
            }
        }
        Ok(())
    }

    /// Reads the counter, preferring the fast stored value.
    ///
    /// Falls back to the authoritative callback when the stored value is
    /// absent, unparsable, negative, or the backend fails — and writes the
    /// recomputed count back as the new baseline. Passing `force` skips the
    /// fast path unconditionally (an explicit recompute request).
    ///
    /// # Errors
    ///
    /// Returns the authoritative callback's error unchanged.
    pub async fn read<F, Fut, E>(&self, force: bool, authoritative: F) -> Result<(i64, CounterSource), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, E>>,
    {
        if !force {
            if let Some(count) = self.fast_read().await {
                return Ok((count, CounterSource::Store));
            }
        }

        let count = self.reconcile(authoritative).await?;
        Ok((count, CounterSource::Authoritative))
    }

    async fn fast_read(&self) -> Option<i64> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::debug!(key = %self.key, %error, "counter read failed; falling back");
                return None;
            }
        };
        let count = std::str::from_utf8(&raw).ok()?.trim().parse::<i64>().ok()?;
        // A negative stored value is drift; let the slow path repair it.
        (count >= 0).then_some(count)
    }

    async fn write_baseline(&self, count: i64) {
        if let Err(error) = self.store.set(&self.key, count.to_string().as_bytes(), None).await {
            tracing::debug!(key = %self.key, %error, "counter baseline write failed");
        }
    }
}
