// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Versioned cache invalidation and self-healing counters over a key-value
//! backend.
//!
//! Vintage sits between read-heavy public endpoints and their source-of-truth
//! store. Public reads serve cached JSON payloads; admin writes invalidate by
//! bumping a per-domain generation version embedded in every cache key, so
//! stale entries are abandoned in place — never deleted — and expire by TTL.
//! A durable counter tracks one operational aggregate and repairs itself from
//! the authoritative count whenever it detects drift.
//!
//! The design trades perfect consistency for simplicity: no transaction spans
//! the store and the cache, no locks coordinate concurrent writers, and every
//! backend failure degrades to "go compute it". The residual staleness window
//! is bounded by the entry TTL and documented on [`ReadCache`].
//!
//! # Components
//!
//! - [`jittered_ttl`]: deterministic key-derived TTL jitter against
//!   synchronized expiry.
//! - [`Param`] / [`versioned_key`]: stable, human-debuggable key
//!   construction.
//! - [`VersionStore`]: per-domain invalidation versions (read, atomic bump).
//! - [`BlobCache`] / [`Lookup`]: byte payloads with out-of-band negative
//!   caching.
//! - [`BoolCache`]: tri-state boolean memoization.
//! - [`Counter`] / [`CounterSource`]: a self-healing durable aggregate.
//! - [`ReadCache`] / [`Outcome`]: the per-endpoint cache-aside orchestrator.
//! - [`DecisionCache`] / [`Verdict`]: versioned authorization memoization.
//!
//! Backends implement the `vintage_kv` contract; `vintage_memory` serves
//! single-process deployments and tests, `vintage_redis` shared deployments.
//!
//! # Example
//!
//! ```
//! use vintage::{Outcome, Param, ReadCache};
//! use vintage_kv::testing::MockStore;
//! # futures::executor::block_on(async {
//!
//! let store = MockStore::new();
//! let catalog = ReadCache::builder(store, "shop", "catalog", "catalog:list").build();
//!
//! // First read misses and recomputes.
//! let params = [Param::text("season", "ss25"), Param::uint("limit", 50)];
//! let outcome = catalog
//!     .read(&params, || async { Ok::<_, std::io::Error>(Some(vec!["gown-1"])) })
//!     .await?;
//! assert!(matches!(outcome, Outcome::Fresh(_)));
//!
//! // A publish on the admin path invalidates the whole domain.
//! catalog.bump_version().await;
//!
//! // The next read embeds the new version and recomputes.
//! let outcome = catalog
//!     .read(&params, || async { Ok::<_, std::io::Error>(Some(vec!["gown-1", "gown-2"])) })
//!     .await?;
//! assert!(matches!(outcome, Outcome::Fresh(_)));
//! # Ok::<(), std::io::Error>(())
//! # });
//! ```

mod blob;
mod counter;
mod decision;
mod flag;
mod jitter;
mod key;
mod read;
mod version;

#[doc(inline)]
pub use blob::{BlobCache, Lookup};
#[doc(inline)]
pub use counter::{Counter, CounterSource};
#[doc(inline)]
pub use decision::{DecisionCache, DecisionCacheBuilder, Verdict};
#[doc(inline)]
pub use flag::BoolCache;
#[doc(inline)]
pub use jitter::jittered_ttl;
#[doc(inline)]
pub use key::{Param, versioned_key};
#[doc(inline)]
pub use read::{Outcome, ReadCache, ReadCacheBuilder};
#[doc(inline)]
pub use version::VersionStore;
