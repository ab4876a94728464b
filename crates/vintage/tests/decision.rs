// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for authorization-decision memoization.

use std::sync::atomic::{AtomicUsize, Ordering};

use vintage::{DecisionCache, Verdict, VersionStore};
use vintage_kv::testing::MockStore;

fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

/// An authorization predicate that counts how often it runs.
struct CountingPredicate {
    allowed: bool,
    calls: AtomicUsize,
}

impl CountingPredicate {
    fn new(allowed: bool) -> Self {
        Self {
            allowed,
            calls: AtomicUsize::new(0),
        }
    }

    async fn check(&self) -> Result<bool, std::io::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.allowed)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[test]
fn verdict_is_memoized_per_resource() {
    block_on(async {
        let decisions = DecisionCache::builder(MockStore::new(), "t", "catalog", "assets:allow").build();
        let predicate = CountingPredicate::new(true);

        for _ in 0..3 {
            let verdict = decisions
                .evaluate("2025/06/gown-1.jpg", || predicate.check())
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Allow);
        }
        assert_eq!(predicate.calls(), 1);

        // A different resource gets its own verdict.
        decisions
            .evaluate("2025/06/gown-2.jpg", || predicate.check())
            .await
            .unwrap();
        assert_eq!(predicate.calls(), 2);
    });
}

#[test]
fn deny_verdicts_are_memoized_too() {
    block_on(async {
        let decisions = DecisionCache::builder(MockStore::new(), "t", "catalog", "assets:allow").build();
        let predicate = CountingPredicate::new(false);

        for _ in 0..2 {
            let verdict = decisions
                .evaluate("secret/draft.jpg", || predicate.check())
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Deny);
            assert!(!verdict.is_allowed());
        }
        assert_eq!(predicate.calls(), 1);
    });
}

#[test]
fn leading_slash_and_padding_normalize_to_the_same_resource() {
    block_on(async {
        let decisions = DecisionCache::builder(MockStore::new(), "t", "catalog", "assets:allow").build();
        let predicate = CountingPredicate::new(true);

        decisions
            .evaluate("/2025/06/gown-1.jpg", || predicate.check())
            .await
            .unwrap();
        decisions
            .evaluate("  2025/06/gown-1.jpg ", || predicate.check())
            .await
            .unwrap();

        assert_eq!(predicate.calls(), 1);
    });
}

#[test]
fn domain_bump_discards_memoized_verdicts() {
    block_on(async {
        let store = MockStore::new();
        let decisions = DecisionCache::builder(store.clone(), "t", "catalog", "assets:allow").build();
        let versions = VersionStore::new(store, "t", "catalog");
        let predicate = CountingPredicate::new(true);

        decisions
            .evaluate("2025/06/gown-1.jpg", || predicate.check())
            .await
            .unwrap();
        assert_eq!(predicate.calls(), 1);

        // An unpublish on the admin path bumps the shared domain version.
        versions.bump().await;

        // The old verdict is unreachable; the predicate runs again.
        decisions
            .evaluate("2025/06/gown-1.jpg", || predicate.check())
            .await
            .unwrap();
        assert_eq!(predicate.calls(), 2);
    });
}

#[test]
fn backend_outage_reruns_the_predicate_every_time() {
    block_on(async {
        let store = MockStore::new();
        let decisions = DecisionCache::builder(store.clone(), "t", "catalog", "assets:allow").build();
        store.fail_when(|_| true);
        let predicate = CountingPredicate::new(true);

        for _ in 0..2 {
            let verdict = decisions
                .evaluate("2025/06/gown-1.jpg", || predicate.check())
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Allow);
        }
        assert_eq!(predicate.calls(), 2);
    });
}

#[test]
fn predicate_errors_propagate_unchanged() {
    block_on(async {
        let decisions =
            DecisionCache::<MockStore>::builder(MockStore::new(), "t", "catalog", "assets:allow").build();

        let result = decisions
            .evaluate("2025/06/gown-1.jpg", || async {
                Err::<bool, _>(std::io::Error::other("db down"))
            })
            .await;
        assert!(result.is_err());
    });
}
