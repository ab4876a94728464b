// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Byte-payload cache with negative caching.

use std::time::Duration;

use vintage_kv::KeyValueStore;

/// Framing tag for a regular payload entry.
const TAG_PAYLOAD: u8 = 0x01;
/// Framing tag (and entire value) of a negative entry.
const TAG_NEGATIVE: u8 = 0x00;

/// Result of a blob cache lookup.
///
/// `ConfirmedAbsent` is the negative-cache outcome: a previous read already
/// asked the source of truth and found nothing, so the caller can return
/// "not found" without asking again. It is distinct from `Miss`, which says
/// nothing either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The cache holds a payload for this key.
    Hit(Vec<u8>),
    /// The cache holds a confirmation that the resource does not exist
    /// upstream.
    ConfirmedAbsent,
    /// The cache has no usable entry (absent, expired, unreadable, or the
    /// backend failed).
    Miss,
}

/// Best-effort cache for opaque byte payloads.
///
/// Entries are framed with a leading tag byte so the negative sentinel lives
/// out-of-band from payload bytes: no legitimate serialized payload can
/// collide with it. Values without a recognized frame read as a miss.
///
/// All failures degrade: a backend error on read is a [`Lookup::Miss`], a
/// backend error on write is dropped. The caller's correctness never depends
/// on a write having happened.
#[derive(Debug, Clone)]
pub struct BlobCache<S> {
    store: S,
}

impl<S: KeyValueStore> BlobCache<S> {
    /// Creates a blob cache over the given backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up `key`, degrading every failure to [`Lookup::Miss`].
    pub async fn get(&self, key: &str) -> Lookup {
        match self.store.get(key).await {
            Ok(Some(raw)) => match raw.split_first() {
                Some((&TAG_PAYLOAD, payload)) => Lookup::Hit(payload.to_vec()),
                Some((&TAG_NEGATIVE, [])) => Lookup::ConfirmedAbsent,
                _ => Lookup::Miss,
            },
            Ok(None) => Lookup::Miss,
            Err(error) => {
                tracing::debug!(key, %error, "blob read failed; treating as miss");
                Lookup::Miss
            }
        }
    }

    /// Stores a payload under `key` for `ttl`. No-op for a zero TTL;
    /// best-effort otherwise.
    pub async fn set(&self, key: &str, payload: &[u8], ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let mut framed = Vec::with_capacity(payload.len() + 1);
        framed.push(TAG_PAYLOAD);
        framed.extend_from_slice(payload);
        if let Err(error) = self.store.set(key, &framed, Some(ttl)).await {
            tracing::debug!(key, %error, "blob write failed; entry skipped");
        }
    }

    /// Stores a negative entry under `key` for `ttl`, recording that the
    /// resource is confirmed absent upstream. No-op for a zero TTL.
    ///
    /// The TTL should be short: it bounds the window in which a
    /// just-published resource still reads as absent.
    pub async fn set_negative(&self, key: &str, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        if let Err(error) = self.store.set(key, &[TAG_NEGATIVE], Some(ttl)).await {
            tracing::debug!(key, %error, "negative write failed; entry skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use vintage_kv::testing::{MockStore, StoreOp};

    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn payload_roundtrip() {
        block_on(async {
            let cache = BlobCache::new(MockStore::new());
            cache.set("k", b"{\"total\":1}", Duration::from_secs(60)).await;
            assert_eq!(cache.get("k").await, Lookup::Hit(b"{\"total\":1}".to_vec()));
        });
    }

    #[test]
    fn negative_entry_reads_as_confirmed_absent() {
        block_on(async {
            let cache = BlobCache::new(MockStore::new());
            cache.set_negative("k", Duration::from_secs(30)).await;
            assert_eq!(cache.get("k").await, Lookup::ConfirmedAbsent);
        });
    }

    #[test]
    fn negative_sentinel_cannot_collide_with_payload_bytes() {
        block_on(async {
            let cache = BlobCache::new(MockStore::new());
            // A payload that happens to be a single zero byte is still a hit.
            cache.set("k", &[TAG_NEGATIVE], Duration::from_secs(30)).await;
            assert_eq!(cache.get("k").await, Lookup::Hit(vec![TAG_NEGATIVE]));
        });
    }

    #[test]
    fn unframed_value_reads_as_miss() {
        block_on(async {
            let store = MockStore::new();
            let cache = BlobCache::new(store.clone());
            store.seed("k", &b"legacy garbage"[..]);
            assert_eq!(cache.get("k").await, Lookup::Miss);
        });
    }

    #[test]
    fn absent_key_is_a_miss() {
        block_on(async {
            let cache = BlobCache::new(MockStore::new());
            assert_eq!(cache.get("nope").await, Lookup::Miss);
        });
    }

    #[test]
    fn backend_errors_degrade_to_miss_and_skipped_writes() {
        block_on(async {
            let store = MockStore::new();
            let cache = BlobCache::new(store.clone());
            store.fail_when(|_| true);

            cache.set("k", b"v", Duration::from_secs(60)).await;
            assert_eq!(cache.get("k").await, Lookup::Miss);
        });
    }

    #[test]
    fn zero_ttl_writes_nothing() {
        block_on(async {
            let store = MockStore::new();
            let cache = BlobCache::new(store.clone());

            cache.set("k", b"v", Duration::ZERO).await;
            cache.set_negative("k2", Duration::ZERO).await;

            assert_eq!(store.operations(), vec![]);
        });
    }

    #[test]
    fn ttl_is_passed_through_to_the_backend() {
        block_on(async {
            let store = MockStore::new();
            let cache = BlobCache::new(store.clone());
            cache.set("k", b"v", Duration::from_secs(42)).await;

            assert!(matches!(
                store.operations().as_slice(),
                [StoreOp::Set { ttl: Some(ttl), .. }] if *ttl == Duration::from_secs(42)
            ));
        });
    }
}
