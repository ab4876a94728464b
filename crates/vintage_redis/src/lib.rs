// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed key-value backend for the vintage caching layer.
//!
//! [`RedisStore`] implements the `vintage_kv` contract over a multiplexed
//! connection manager. The store is a cheap clonable handle; all state lives
//! in Redis, so multiple server processes share one set of versions, cache
//! entries, and counters as long as they agree on key prefixes.
//!
//! Connect and per-command timeouts are bounded by [`RedisConfig`] so a dead
//! backend degrades the caller to its miss path instead of hanging the
//! request.
//!
//! ```no_run
//! use vintage_redis::{RedisConfig, RedisStore};
//!
//! # async fn connect() -> vintage_kv::Result<()> {
//! let store = RedisStore::connect(RedisConfig::new("redis://localhost:6379")).await?;
//! # Ok(())
//! # }
//! ```

mod store;

#[doc(inline)]
pub use store::{RedisConfig, RedisStore};
