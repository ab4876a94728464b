// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process key-value backend for the vintage caching layer.
//!
//! [`InMemoryStore`] implements the `vintage_kv` contract with a hash map
//! behind a mutex. TTLs are honored lazily against a [`tick::Clock`], which
//! makes expiry fully deterministic in tests: freeze the clock, write an
//! entry with a TTL, advance past the deadline, observe the miss.
//!
//! This backend is suitable for single-process deployments (every process
//! would otherwise maintain its own versions and counters — fine when there
//! is only one) and for tests. Multi-process deployments share state through
//! `vintage_redis` instead.

mod store;

#[doc(inline)]
pub use store::InMemoryStore;
