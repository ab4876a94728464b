// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Key-value backend contract for the vintage caching layer.
//!
//! This crate defines the [`KeyValueStore`] trait that all cache backends must
//! satisfy, along with the [`Error`] type for fallible operations. The contract
//! is deliberately minimal: anything offering get/set with TTL, an atomic
//! increment, and an existence probe qualifies — a networked store such as
//! Redis, or an in-process map for tests and single-instance deployments.
//!
//! # Overview
//!
//! The backend abstraction separates storage concerns from caching semantics.
//! Implement [`KeyValueStore`] for your storage backend, then use `vintage` to
//! layer versioned invalidation, negative caching, and self-healing counters
//! on top.
//!
//! Values are opaque byte strings. Counter and version keys additionally rely
//! on the backend's [`incr_by`](KeyValueStore::incr_by) treating stored values
//! as ASCII-decimal integers, which matches Redis `INCRBY` semantics.
//!
//! # Implementing a Backend
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//! use vintage_kv::{Error, KeyValueStore, Result};
//!
//! struct SimpleStore(RwLock<HashMap<String, Vec<u8>>>);
//!
//! impl KeyValueStore for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: &[u8], _ttl: Option<Duration>) -> Result<()> {
//!         self.0.write().unwrap().insert(key.to_owned(), value.to_vec());
//!         Ok(())
//!     }
//!
//!     async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
//!         let mut map = self.0.write().unwrap();
//!         let current = match map.get(key) {
//!             Some(raw) => std::str::from_utf8(raw)
//!                 .map_err(Error::from_message)?
//!                 .parse::<i64>()
//!                 .map_err(Error::from_message)?,
//!             None => 0,
//!         };
//!         let next = current + delta;
//!         map.insert(key.to_owned(), next.to_string().into_bytes());
//!         Ok(next)
//!     }
//!
//!     async fn exists(&self, key: &str) -> Result<bool> {
//!         Ok(self.0.read().unwrap().contains_key(key))
//!     }
//! }
//! ```

pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::KeyValueStore;
