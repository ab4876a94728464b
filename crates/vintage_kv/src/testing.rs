// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend implementation for testing.
//!
//! This module provides [`MockStore`], a configurable in-memory backend that
//! records all operations and supports failure injection for testing the
//! degradation paths of the caching layer.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{Error, KeyValueStore, Result};

/// Recorded backend operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The bytes that were written.
        value: Vec<u8>,
        /// The TTL the caller requested, `None` meaning durable.
        ttl: Option<Duration>,
    },
    /// An atomic increment was performed.
    IncrBy {
        /// The key that was incremented.
        key: String,
        /// The delta that was applied.
        delta: i64,
    },
    /// An existence probe was performed with the given key.
    Exists(String),
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock backend for testing.
///
/// The store keeps values in memory and can be configured to fail operations
/// on demand, making it useful for testing the "backend unavailable" paths.
/// All operations are recorded for later verification. TTLs are recorded but
/// not simulated — deterministic expiry testing is what `vintage_memory`
/// with a frozen clock is for.
///
/// Cloning shares the underlying state, so a test can hand one clone to the
/// code under test and keep another for assertions.
///
/// # Examples
///
/// ```
/// use vintage_kv::testing::{MockStore, StoreOp};
/// use vintage_kv::KeyValueStore;
/// # futures::executor::block_on(async {
///
/// let store = MockStore::new();
///
/// store.set("k", b"v", None).await?;
/// assert_eq!(store.get("k").await?, Some(b"v".to_vec()));
///
/// assert_eq!(store.operations(), vec![
///     StoreOp::Set { key: "k".into(), value: b"v".to_vec(), ttl: None },
///     StoreOp::Get("k".into()),
/// ]);
/// # Ok::<(), vintage_kv::Error>(())
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use vintage_kv::testing::{MockStore, StoreOp};
/// use vintage_kv::KeyValueStore;
/// # futures::executor::block_on(async {
///
/// let store = MockStore::new();
///
/// // Fail only gets for a specific key.
/// store.fail_when(|op| matches!(op, StoreOp::Get(k) if k == "forbidden"));
/// assert!(store.get("forbidden").await.is_err());
/// assert!(store.get("allowed").await.is_ok());
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing operation recording.
    ///
    /// Useful for staging corrupted or pre-existing state before the code
    /// under test runs.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.lock().insert(key.into(), value.into());
    }

    /// Drops a key outright, simulating backend eviction or a flush.
    pub fn evict(&self, key: &str) {
        self.data.lock().remove(key);
    }

    /// Returns the raw bytes currently stored under `key`, if any.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should
    /// fail. Failed operations are still recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use vintage_kv::testing::{MockStore, StoreOp};
    ///
    /// let store = MockStore::new();
    ///
    /// // Fail all operations (backend outage).
    /// store.fail_when(|_| true);
    ///
    /// // Fail only increments.
    /// store.fail_when(|op| matches!(op, StoreOp::IncrBy { .. }));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &StoreOp) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let op = StoreOp::Get(key.to_owned());
        if self.should_fail(&op) {
            self.record(op);
            return Err(Error::caused_by("mock: get failed"));
        }
        self.record(op);
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let op = StoreOp::Set {
            key: key.to_owned(),
            value: value.to_vec(),
            ttl,
        };
        if self.should_fail(&op) {
            self.record(op);
            return Err(Error::caused_by("mock: set failed"));
        }
        self.record(op);
        self.data.lock().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let op = StoreOp::IncrBy {
            key: key.to_owned(),
            delta,
        };
        if self.should_fail(&op) {
            self.record(op);
            return Err(Error::caused_by("mock: incr_by failed"));
        }
        self.record(op);

        let mut data = self.data.lock();
        let current = match data.get(key) {
            Some(raw) => std::str::from_utf8(raw)
                .map_err(Error::from_message)?
                .trim()
                .parse::<i64>()
                .map_err(Error::from_message)?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| Error::caused_by("mock: increment overflow"))?;
        data.insert(key.to_owned(), next.to_string().into_bytes());
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let op = StoreOp::Exists(key.to_owned());
        if self.should_fail(&op) {
            self.record(op);
            return Err(Error::caused_by("mock: exists failed"));
        }
        self.record(op);
        Ok(self.data.lock().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn incr_by_creates_key_at_delta() {
        block_on(async {
            let store = MockStore::new();
            assert_eq!(store.incr_by("n", 5).await.unwrap(), 5);
            assert_eq!(store.raw("n"), Some(b"5".to_vec()));
        });
    }

    #[test]
    fn incr_by_accumulates_and_goes_negative() {
        block_on(async {
            let store = MockStore::new();
            assert_eq!(store.incr_by("n", 1).await.unwrap(), 1);
            assert_eq!(store.incr_by("n", -3).await.unwrap(), -2);
        });
    }

    #[test]
    fn incr_by_rejects_non_numeric_values() {
        block_on(async {
            let store = MockStore::new();
            store.seed("n", &b"not a number"[..]);
            assert!(store.incr_by("n", 1).await.is_err());
        });
    }

    #[test]
    fn failed_operations_are_still_recorded() {
        block_on(async {
            let store = MockStore::new();
            store.fail_when(|op| matches!(op, StoreOp::Exists(_)));
            assert!(store.exists("k").await.is_err());
            assert_eq!(store.operations(), vec![StoreOp::Exists("k".into())]);
        });
    }

    #[test]
    fn clones_share_state() {
        block_on(async {
            let store = MockStore::new();
            let observer = store.clone();
            store.set("k", b"v", None).await.unwrap();
            assert!(observer.contains_key("k"));
        });
    }
}
