//! Deterministic cache key composition
//!
//! Keys are exposed to callers so repeated lookups with identical
//! parameters address the same entry and the same history series.

use std::collections::BTreeMap;

/// Builds the composite key `"{kind}:{target}:{params}"`
///
/// Parameters serialize as sorted JSON (the `BTreeMap` guarantees key
/// order), so insertion order never changes the key.
#[must_use]
pub fn cache_key(kind: &str, target: &str, params: &BTreeMap<String, String>) -> String {
    let params_json = serde_json::to_string(params).unwrap_or_else(|_| String::from("{}"));
    format!("{kind}:{target}:{params_json}")
}

/// Shorthand for a key without extra parameters
#[must_use]
pub fn simple_key(kind: &str, target: &str) -> String {
    cache_key(kind, target, &BTreeMap::new())
}
