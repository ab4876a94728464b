// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hash-map backend with clock-driven TTL expiry.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;
use tick::Clock;
use vintage_kv::{Error, KeyValueStore, Result};

#[derive(Debug, Clone)]
struct Slot {
    value: Vec<u8>,
    /// Absolute expiry deadline; `None` means durable.
    expires_at: Option<SystemTime>,
}

/// An in-process key-value backend with lazy TTL expiry.
///
/// Entries past their deadline are removed when next touched and reported
/// absent; there is no background sweeper. Cloning is cheap and shares the
/// underlying state, so one store can be handed to several cache components.
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use vintage_kv::KeyValueStore;
/// use vintage_memory::InMemoryStore;
/// # futures::executor::block_on(async {
///
/// let store = InMemoryStore::new(Clock::new_frozen());
///
/// store.set("k", b"v", None).await?;
/// assert_eq!(store.get("k").await?, Some(b"v".to_vec()));
/// # Ok::<(), vintage_kv::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    clock: Clock,
}

impl InMemoryStore {
    /// Creates a new empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Returns the number of entries, counting not-yet-collected expired ones.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Removes the slot for `key` if it has expired, then returns a clone of
    /// the live value. Must be called with the lock held via the passed map.
    fn live_value(map: &mut HashMap<String, Slot>, key: &str, now: SystemTime) -> Option<Vec<u8>> {
        let expired = map
            .get(key)
            .is_some_and(|slot| slot.expires_at.is_some_and(|deadline| now >= deadline));
        if expired {
            map.remove(key);
            return None;
        }
        map.get(key).map(|slot| slot.value.clone())
    }
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.system_time();
        let mut slots = self.slots.lock();
        Ok(Self::live_value(&mut slots, key, now))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|d| self.clock.system_time() + d);
        self.slots.lock().insert(
            key.to_owned(),
            Slot {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let now = self.clock.system_time();
        let mut slots = self.slots.lock();

        let (current, expires_at) = match Self::live_value(&mut slots, key, now) {
            Some(raw) => {
                let parsed = std::str::from_utf8(&raw)
                    .map_err(Error::from_message)?
                    .trim()
                    .parse::<i64>()
                    .map_err(Error::from_message)?;
                // INCRBY preserves the key's remaining TTL.
                (parsed, slots.get(key).and_then(|slot| slot.expires_at))
            }
            None => (0, None),
        };

        let next = current
            .checked_add(delta)
            .ok_or_else(|| Error::from_message("increment overflow"))?;
        slots.insert(
            key.to_owned(),
            Slot {
                value: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = self.clock.system_time();
        let mut slots = self.slots.lock();
        Ok(Self::live_value(&mut slots, key, now).is_some())
    }
}

#[cfg(test)]
mod tests {
    use tick::ClockControl;

    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn ttl_entry_expires_after_deadline() {
        block_on(async {
            let control = ClockControl::new();
            let store = InMemoryStore::new(control.to_clock());

            store.set("k", b"v", Some(Duration::from_secs(30))).await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

            control.advance(Duration::from_secs(29));
            assert!(store.get("k").await.unwrap().is_some());

            control.advance(Duration::from_secs(1));
            assert!(store.get("k").await.unwrap().is_none());
            assert!(!store.exists("k").await.unwrap());
        });
    }

    #[test]
    fn durable_entry_survives_time_passing() {
        block_on(async {
            let control = ClockControl::new();
            let store = InMemoryStore::new(control.to_clock());

            store.set("k", b"v", None).await.unwrap();
            control.advance(Duration::from_secs(86_400));
            assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        });
    }

    #[test]
    fn incr_by_creates_key_at_delta_and_accumulates() {
        block_on(async {
            let store = InMemoryStore::new(Clock::new_frozen());
            assert_eq!(store.incr_by("n", 1).await.unwrap(), 1);
            assert_eq!(store.incr_by("n", 2).await.unwrap(), 3);
            assert_eq!(store.incr_by("n", -4).await.unwrap(), -1);
            assert_eq!(store.get("n").await.unwrap(), Some(b"-1".to_vec()));
        });
    }

    #[test]
    fn incr_by_treats_expired_value_as_absent() {
        block_on(async {
            let control = ClockControl::new();
            let store = InMemoryStore::new(control.to_clock());

            store.set("n", b"41", Some(Duration::from_secs(10))).await.unwrap();
            control.advance(Duration::from_secs(11));
            assert_eq!(store.incr_by("n", 1).await.unwrap(), 1);
        });
    }

    #[test]
    fn incr_by_preserves_remaining_ttl() {
        block_on(async {
            let control = ClockControl::new();
            let store = InMemoryStore::new(control.to_clock());

            store.set("n", b"1", Some(Duration::from_secs(10))).await.unwrap();
            store.incr_by("n", 1).await.unwrap();

            control.advance(Duration::from_secs(11));
            assert!(store.get("n").await.unwrap().is_none());
        });
    }

    #[test]
    fn incr_by_rejects_non_numeric_values() {
        block_on(async {
            let store = InMemoryStore::new(Clock::new_frozen());
            store.set("n", b"payload", None).await.unwrap();
            assert!(store.incr_by("n", 1).await.is_err());
        });
    }

    #[test]
    fn clones_share_state() {
        block_on(async {
            let store = InMemoryStore::new(Clock::new_frozen());
            let observer = store.clone();
            store.set("k", b"v", None).await.unwrap();
            assert_eq!(observer.get("k").await.unwrap(), Some(b"v".to_vec()));
        });
    }
}
