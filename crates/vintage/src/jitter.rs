// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key-derived TTL jitter.
//!
//! When many keys are written in a burst (a version bump invalidates a whole
//! namespace and the next wave of reads repopulates it), identical TTLs make
//! them all expire in the same instant and the backend takes a synchronized
//! miss storm. Spreading each key's TTL by a deterministic, key-derived
//! offset decorrelates the expiries without any shared state.

use std::time::Duration;

use xxhash_rust::xxh3::xxh3_64;

/// Returns `base` extended by a deterministic jitter derived from `key`.
///
/// The offset lies in `[0, base * min(max_fraction, 1))`, so the result is
/// never below `base` and never above `base * (1 + max_fraction)`. A zero
/// `base` or nonpositive `max_fraction` disables jitter and returns `base`
/// unchanged.
///
/// Determinism matters: the same key always gets the same TTL, so rewriting
/// an entry does not ratchet its lifetime upward. Only *different* keys need
/// to be decorrelated from each other.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vintage::jittered_ttl;
///
/// let base = Duration::from_secs(300);
/// let ttl = jittered_ttl(base, "catalog:list:v3:season=ss25", 0.2);
/// assert!(ttl >= base);
/// assert!(ttl <= base.mul_f64(1.2));
/// assert_eq!(ttl, jittered_ttl(base, "catalog:list:v3:season=ss25", 0.2));
/// ```
#[must_use]
pub fn jittered_ttl(base: Duration, key: &str, max_fraction: f64) -> Duration {
    if base.is_zero() || max_fraction <= 0.0 {
        return base;
    }

    let span = base.mul_f64(max_fraction.min(1.0));
    let span_nanos = span.as_nanos();
    if span_nanos == 0 {
        return base;
    }

    let offset = u128::from(xxh3_64(key.as_bytes())) % span_nanos;
    base + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn same_key_same_jitter() {
        let base = Duration::from_secs(60);
        let first = jittered_ttl(base, "a:key", 0.5);
        for _ in 0..10 {
            assert_eq!(jittered_ttl(base, "a:key", 0.5), first);
        }
    }

    #[test]
    fn zero_base_returned_unchanged() {
        assert_eq!(jittered_ttl(Duration::ZERO, "k", 0.5), Duration::ZERO);
    }

    #[test]
    fn nonpositive_fraction_disables_jitter() {
        let base = Duration::from_secs(60);
        assert_eq!(jittered_ttl(base, "k", 0.0), base);
        assert_eq!(jittered_ttl(base, "k", -1.0), base);
    }

    #[test]
    fn fraction_above_one_is_capped() {
        let base = Duration::from_secs(60);
        let ttl = jittered_ttl(base, "k", 5.0);
        assert!(ttl < base * 2);
    }

    #[test]
    fn outputs_stay_within_bounds_and_spread() {
        let base = Duration::from_secs(300);
        let fraction = 0.2;
        let ceiling = base.mul_f64(1.0 + fraction);

        let mut distinct = HashSet::new();
        for i in 0..1000 {
            let ttl = jittered_ttl(base, &format!("key-{i}"), fraction);
            assert!(ttl >= base, "ttl below base for key-{i}");
            assert!(ttl <= ceiling, "ttl above ceiling for key-{i}");
            distinct.insert(ttl);
        }
        // Distribution sanity: 1000 keys must not all collapse to one value.
        assert!(distinct.len() > 1);
    }
}
