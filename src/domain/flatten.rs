//! Projection of nested attendee payloads into dotted column paths.
//!
//! Billetweb returns attendees as JSON objects whose shape varies per event
//! (custom form fields live under a nested `custom` object). Every table
//! column, search column and column-registry entry is a *leaf path* in that
//! object: nested mapping keys joined with `.`.
//!
//! ```text
//! { "name": "Doe", "custom": { "phone": "0123" } }
//!   -> [ ("name", "Doe"), ("custom.phone", "0123") ]
//! ```
//!
//! Arrays are leaves: they are rendered as compact JSON and never recursed
//! into, so structured array items are not addressable as columns.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use utoipa::ToSchema;

use crate::error::SyncError;

/// Nesting depth beyond which a record is rejected as malformed.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Prefix Billetweb uses for event-specific form fields.
const CUSTOM_PREFIX: &str = "custom.";

/// One `(path, value)` pair of a flattened record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FlattenedEntry {
    /// Dotted leaf path, e.g. `custom.phone`.
    pub key: String,
    /// Stringified leaf value; `null` becomes the empty string.
    pub value: String,
}

/// Flattens `record` into leaf entries in traversal order, using
/// [`DEFAULT_MAX_DEPTH`].
///
/// # Errors
///
/// Returns [`SyncError::MalformedRecord`] if nested mappings go deeper than
/// [`DEFAULT_MAX_DEPTH`].
pub fn flatten(record: &Map<String, Value>) -> Result<Vec<FlattenedEntry>, SyncError> {
    flatten_with_limit(record, DEFAULT_MAX_DEPTH)
}

/// Flattens `record`, rejecting mappings nested more than `max_depth` levels
/// (the top-level mapping counts as level 1).
///
/// # Errors
///
/// Returns [`SyncError::MalformedRecord`] when the depth bound is exceeded.
pub fn flatten_with_limit(
    record: &Map<String, Value>,
    max_depth: usize,
) -> Result<Vec<FlattenedEntry>, SyncError> {
    let mut out = Vec::with_capacity(record.len());
    flatten_into(record, "", 1, max_depth, &mut out)?;
    Ok(out)
}

fn flatten_into(
    map: &Map<String, Value>,
    parent: &str,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<FlattenedEntry>,
) -> Result<(), SyncError> {
    if depth > max_depth {
        return Err(SyncError::MalformedRecord { depth: max_depth });
    }
    for (key, value) in map {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };
        match value {
            Value::Object(child) => flatten_into(child, &path, depth + 1, max_depth, out)?,
            leaf => out.push(FlattenedEntry {
                key: path,
                value: stringify_leaf(leaf),
            }),
        }
    }
    Ok(())
}

/// Renders a non-mapping JSON value as a cell string.
#[must_use]
pub fn stringify_leaf(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        // Objects only reach here when a caller stringifies a subtree
        // explicitly; both are rendered as compact JSON.
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Integral floats print without a fractional part (`1.0` gives `"1"`),
/// matching how integers print.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

/// Path-to-value lookup over a flattened record.
///
/// When two leaves produce the same path (a literal `"a.b"` key next to a
/// nested `a.b`), the one visited last wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    values: HashMap<String, String>,
}

impl FlatRecord {
    /// Flattens `record` and indexes the entries by path.
    ///
    /// # Errors
    ///
    /// Propagates [`SyncError::MalformedRecord`] from [`flatten_with_limit`].
    pub fn from_record(record: &Map<String, Value>, max_depth: usize) -> Result<Self, SyncError> {
        Ok(flatten_with_limit(record, max_depth)?.into_iter().collect())
    }

    /// Returns the value at `path`, if the record has that leaf.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.values.get(path).map(String::as_str)
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the record had no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<FlattenedEntry> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = FlattenedEntry>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|e| (e.key, e.value)).collect(),
        }
    }
}

/// Strips a leading `custom.` from a column path for headers and labels.
///
/// Presentation only: lookups, storage and search keep the full path.
#[must_use]
pub fn format_key_for_display(key: &str) -> &str {
    key.strip_prefix(CUSTOM_PREFIX).unwrap_or(key)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("test fixture must be an object");
        };
        map
    }

    fn keys(entries: &[FlattenedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    /// Leaf paths computed independently of the flattener.
    fn leaf_paths(value: &Value, prefix: &str, out: &mut BTreeSet<String>) {
        if let Value::Object(map) = value {
            for (k, v) in map {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                if v.is_object() {
                    leaf_paths(v, &path, out);
                } else {
                    out.insert(path);
                }
            }
        }
    }

    #[test]
    fn empty_record_flattens_to_nothing() {
        let Ok(entries) = flatten(&Map::new()) else {
            panic!("flatten failed");
        };
        assert!(entries.is_empty());
    }

    #[test]
    fn nested_mapping_joins_keys_with_dots() {
        let Ok(entries) = flatten(&obj(json!({"a": {"b": {"c": "x"}}}))) else {
            panic!("flatten failed");
        };
        assert_eq!(
            entries,
            vec![FlattenedEntry {
                key: "a.b.c".to_string(),
                value: "x".to_string()
            }]
        );
    }

    #[test]
    fn preserves_traversal_order() {
        let record = obj(json!({
            "name": "Doe",
            "custom": {"phone": "0123", "pseudo": "jd"},
            "email": "jd@example.com"
        }));
        let Ok(entries) = flatten(&record) else {
            panic!("flatten failed");
        };
        assert_eq!(
            keys(&entries),
            vec!["name", "custom.phone", "custom.pseudo", "email"]
        );
    }

    #[test]
    fn scalars_are_stringified() {
        let record = obj(json!({
            "n": 12,
            "f": 1.5,
            "t": true,
            "z": null,
            "s": "text"
        }));
        let Ok(entries) = flatten(&record) else {
            panic!("flatten failed");
        };
        let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["12", "1.5", "true", "", "text"]);
    }

    #[test]
    fn integral_floats_print_like_integers() {
        let record = obj(json!({"a": 1.0, "b": -3.0, "c": -0.0, "d": 2.25, "e": 1e300}));
        let Ok(entries) = flatten(&record) else {
            panic!("flatten failed");
        };
        let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values.get(..4), Some(&["1", "-3", "0", "2.25"][..]));
        assert_eq!(values.get(4), Some(&"1e300"));
    }

    #[test]
    fn arrays_are_opaque_leaves() {
        let record = obj(json!({"tags": [{"id": 1}, {"id": 2}], "empty": []}));
        let Ok(entries) = flatten(&record) else {
            panic!("flatten failed");
        };
        assert_eq!(keys(&entries), vec!["tags", "empty"]);
        assert_eq!(entries.first().map(|e| e.value.as_str()), Some(r#"[{"id":1},{"id":2}]"#));
    }

    #[test]
    fn empty_nested_mapping_contributes_no_leaf() {
        let Ok(entries) = flatten(&obj(json!({"custom": {}, "a": "1"}))) else {
            panic!("flatten failed");
        };
        assert_eq!(keys(&entries), vec!["a"]);
    }

    #[test]
    fn key_set_equals_leaf_paths() {
        let value = json!({
            "id": "1",
            "custom": {"phone": "1", "address": {"city": "Lyon", "zip": 69000}},
            "list": [1, 2],
            "none": null
        });
        let Ok(entries) = flatten(&obj(value.clone())) else {
            panic!("flatten failed");
        };
        let produced: BTreeSet<String> = entries.into_iter().map(|e| e.key).collect();
        let mut expected = BTreeSet::new();
        leaf_paths(&value, "", &mut expected);
        assert_eq!(produced, expected);
    }

    #[test]
    fn flattening_is_deterministic() {
        let record = obj(json!({"b": {"y": 1, "x": 2}, "a": "z"}));
        let (Ok(first), Ok(second)) = (flatten(&record), flatten(&record)) else {
            panic!("flatten failed");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn depth_limit_rejects_deep_records() {
        let record = obj(json!({"a": {"b": {"c": "x"}}}));
        assert!(flatten_with_limit(&record, 3).is_ok());
        let Err(err) = flatten_with_limit(&record, 2) else {
            panic!("expected depth failure");
        };
        assert!(matches!(err, SyncError::MalformedRecord { depth: 2 }));
    }

    #[test]
    fn default_limit_rejects_pathological_nesting() {
        let mut value = json!("leaf");
        for _ in 0..40 {
            value = json!({ "k": value });
        }
        assert!(flatten(&obj(value)).is_err());
    }

    #[test]
    fn flat_record_lookup_and_collision() {
        let record = obj(json!({"a.b": "literal", "a": {"b": "nested"}, "c": "3"}));
        let Ok(flat) = FlatRecord::from_record(&record, DEFAULT_MAX_DEPTH) else {
            panic!("flatten failed");
        };
        assert_eq!(flat.get("a.b"), Some("nested"));
        assert_eq!(flat.get("c"), Some("3"));
        assert_eq!(flat.get("missing"), None);
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn display_key_strips_custom_prefix_once() {
        assert_eq!(format_key_for_display("custom.phone"), "phone");
        assert_eq!(format_key_for_display("event_name"), "event_name");
        assert_eq!(format_key_for_display("custom.custom.x"), "custom.x");
        assert_eq!(format_key_for_display("customer"), "customer");
    }
}
