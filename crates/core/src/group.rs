//! Group dimension hashing and labelling.
//!
//! A "group" is a small key/value map (e.g. `{"region": "NY"}`) used to
//! partition dashboards and aggregates. [`hash`] produces a stable short hex
//! digest over the canonicalized map; collisions are acceptable here, the
//! hash partitions counters, it does not protect anything.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Sentinel used for an empty or absent group.
pub const DEFAULT_GROUP: &str = "default";

/// Label separator between `key=value` pairs.
const LABEL_SEPARATOR: &str = " / ";

/// Hex length of the digest prefix (8 bytes).
const HASH_LEN: usize = 16;

/// Stable short hash of a group map.
///
/// Keys are sorted, the map is serialized deterministically, and the first
/// 8 bytes of the SHA-256 digest are returned as 16 hex chars. Non-object or
/// empty values yield [`DEFAULT_GROUP`].
pub fn hash(group: &Value) -> String {
    let Some(map) = group.as_object() else {
        return DEFAULT_GROUP.to_string();
    };
    if map.is_empty() {
        return DEFAULT_GROUP.to_string();
    }
    let sorted: BTreeMap<&String, &Value> = map.iter().collect();
    match serde_json::to_string(&sorted) {
        Ok(canonical) => {
            let digest = format!("{:x}", Sha256::digest(canonical.as_bytes()));
            digest[..HASH_LEN].to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to canonicalize group dims");
            DEFAULT_GROUP.to_string()
        }
    }
}

/// Human-readable label: sorted `key=value` pairs joined by `" / "`.
///
/// Non-object or empty values yield [`DEFAULT_GROUP`].
pub fn label(group: &Value) -> String {
    let Some(map) = group.as_object() else {
        return DEFAULT_GROUP.to_string();
    };
    if map.is_empty() {
        return DEFAULT_GROUP.to_string();
    }
    let sorted: BTreeMap<&String, &Value> = map.iter().collect();
    sorted
        .iter()
        .map(|(key, value)| format!("{key}={}", value_text(value)))
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

/// Bare text for a JSON value: strings unquoted, everything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_group_is_default() {
        assert_eq!(hash(&json!({})), DEFAULT_GROUP);
        assert_eq!(label(&json!({})), DEFAULT_GROUP);
        assert_eq!(hash(&Value::Null), DEFAULT_GROUP);
    }

    #[test]
    fn hash_is_key_order_independent() {
        let a = json!({"region": "NY", "desk": "fx"});
        let b = json!({"desk": "fx", "region": "NY"});
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn hash_is_fixed_width_hex() {
        let digest = hash(&json!({"region": "NY"}));
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_groups_hash_differently() {
        assert_ne!(hash(&json!({"region": "NY"})), hash(&json!({"region": "LN"})));
    }

    #[test]
    fn label_sorts_keys_and_joins() {
        let group = json!({"region": "NY", "desk": "fx"});
        assert_eq!(label(&group), "desk=fx / region=NY");
    }

    #[test]
    fn label_renders_non_string_values_as_json() {
        let group = json!({"priority": 3});
        assert_eq!(label(&group), "priority=3");
    }
}
