// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Versioned cache-key construction.
//!
//! Keys are the only contract tying reads to writes, so they must be stable
//! across processes and restarts, byte-identical for semantically identical
//! requests, and readable enough to eyeball in `redis-cli`. The shape is a
//! query-like string:
//!
//! ```text
//! {prefix}:{namespace}:v{version}:{name}={value}:{name}={value}
//! ```
//!
//! The version segment is what makes invalidation work: bumping a domain's
//! version changes every key built against it, abandoning the old entries in
//! place.

/// Stand-in for an empty or invalid parameter value.
///
/// Empty values must still occupy their position in the key, otherwise
/// `season=` and a missing season would collide with each other's neighbors.
const PLACEHOLDER: &str = "-";

/// A single normalized request parameter destined for a cache key.
///
/// Construction normalizes the value so equal requests produce identical
/// keys: text is trimmed and separator characters are substituted (never
/// escaped-and-kept), empty values become a placeholder, and token values
/// outside their allowed set are reset to the placeholder.
///
/// # Examples
///
/// ```
/// use vintage::Param;
///
/// assert_eq!(Param::text("season", "  ss25 ").render(), "season=ss25");
/// assert_eq!(Param::text("season", "").render(), "season=-");
/// assert_eq!(Param::text("q", "a:b c").render(), "q=a_b_c");
/// assert_eq!(Param::token("is_new", "yes", &["true", "false"]).render(), "is_new=-");
/// assert_eq!(Param::int("offset", 40).render(), "offset=40");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: &'static str,
    value: String,
}

impl Param {
    /// A free-text parameter: trimmed, separator-substituted, empty treated
    /// as unset.
    #[must_use]
    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            value: sanitize(value),
        }
    }

    /// An enum-like parameter constrained to `allowed`; anything else is
    /// treated as unset rather than poisoning the keyspace with arbitrary
    /// client input.
    #[must_use]
    pub fn token(name: &'static str, value: &str, allowed: &[&str]) -> Self {
        let trimmed = value.trim();
        let value = if allowed.contains(&trimmed) {
            trimmed.to_owned()
        } else {
            PLACEHOLDER.to_owned()
        };
        Self { name, value }
    }

    /// A signed numeric parameter.
    #[must_use]
    pub fn int(name: &'static str, value: i64) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }

    /// An unsigned numeric parameter (record identifiers, limits, offsets).
    #[must_use]
    pub fn uint(name: &'static str, value: u64) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }

    /// Renders the parameter as its `name=value` key segment.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Builds the cache key for one versioned read.
///
/// Equal normalized inputs produce byte-identical keys; changing the
/// namespace, the version, or any parameter changes the key.
///
/// # Examples
///
/// ```
/// use vintage::{Param, versioned_key};
///
/// let key = versioned_key(
///     "shop",
///     "catalog:list",
///     3,
///     &[Param::text("season", "ss25"), Param::uint("limit", 50)],
/// );
/// assert_eq!(key, "shop:catalog:list:v3:season=ss25:limit=50");
/// ```
#[must_use]
pub fn versioned_key(prefix: &str, namespace: &str, version: u64, params: &[Param]) -> String {
    let mut key = format!("{prefix}:{namespace}:v{version}");
    for param in params {
        key.push(':');
        key.push_str(&param.render());
    }
    key
}

/// Keeps key segments readable while ruling out accidental separators.
fn sanitize(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER.to_owned();
    }
    trimmed
        .chars()
        .map(|c| if matches!(c, ':' | ' ' | '\n' | '\r') { '_' } else { c })
        .collect()
}
