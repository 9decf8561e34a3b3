//! Options records and the inheritance/override merge.
//!
//! An options record is a JSON object. Effective options for a node are a
//! layered merge, lowest to highest precedence: global defaults, ancestor
//! scope options, the node's own explicit options, and an override entry
//! targeted at the node's reference name.

use lazy_static::lazy_static;
use serde_json::{Map, Value};

pub mod validate;

pub use validate::{validate_options, ValidationIssue};

/// Override-list key applied when building application children.
pub const APPLICATION_OVERRIDES: &str = "application_overrides";
/// Override-list key applied when building rule-set children.
pub const RULE_SET_OVERRIDES: &str = "rule_set_overrides";
/// Override-list key applied when building rule children.
pub const RULE_OVERRIDES: &str = "rule_overrides";

/// Field naming the target child of an override entry.
pub const REF_NAME_KEY: &str = "ref_name";
/// Field carrying the options record of an override entry.
pub const OPTIONS_KEY: &str = "options";

lazy_static! {
    static ref GLOBAL_DEFAULTS: Value = Value::Object(Map::new());
}

/// The lowest-precedence options layer shared by every scope.
pub fn global_defaults() -> &'static Value {
    &GLOBAL_DEFAULTS
}

pub fn empty_options() -> Value {
    Value::Object(Map::new())
}

/// Deep-merges `source` into `target` and returns the merged record.
///
/// Object fields merge key by key, recursively. On a scalar conflict `source`
/// wins when `overwrite` is true, `target` otherwise. An array whose entries
/// are all objects carrying a string `ref_name` is an override list and is
/// merged by matching entries on `ref_name`: matched entries merge
/// recursively, unmatched `source` entries are appended. Any other array is
/// treated as a scalar.
pub fn merge_options(target: &Value, source: &Value, overwrite: bool) -> Value {
    match (target, source) {
        (Value::Object(target_fields), Value::Object(source_fields)) => {
            let mut merged = target_fields.clone();
            for (key, source_value) in source_fields {
                let merged_value = match merged.get(key) {
                    Some(target_value) => merge_field(target_value, source_value, overwrite),
                    None => source_value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ if overwrite => source.clone(),
        _ => target.clone(),
    }
}

fn merge_field(target: &Value, source: &Value, overwrite: bool) -> Value {
    match (target, source) {
        (Value::Object(_), Value::Object(_)) => merge_options(target, source, overwrite),
        (Value::Array(target_entries), Value::Array(source_entries))
            if is_override_list(target_entries) && is_override_list(source_entries) =>
        {
            merge_override_lists(target_entries, source_entries, overwrite)
        }
        _ if overwrite => source.clone(),
        _ => target.clone(),
    }
}

fn is_override_list(entries: &[Value]) -> bool {
    !entries.is_empty()
        && entries
            .iter()
            .all(|entry| entry.get(REF_NAME_KEY).is_some_and(Value::is_string))
}

fn merge_override_lists(target: &[Value], source: &[Value], overwrite: bool) -> Value {
    let mut merged = target.to_vec();
    for entry in source {
        let target_name = entry.get(REF_NAME_KEY).and_then(Value::as_str);
        let matched = merged
            .iter_mut()
            .find(|existing| existing.get(REF_NAME_KEY).and_then(Value::as_str) == target_name);
        match matched {
            Some(existing) => {
                let updated = merge_options(existing, entry, overwrite);
                *existing = updated;
            }
            None => merged.push(entry.clone()),
        }
    }
    Value::Array(merged)
}

/// The options record of the entry in `options[list_key]` targeting
/// `ref_name`, if any.
pub fn override_for<'a>(options: &'a Value, list_key: &str, ref_name: &str) -> Option<&'a Value> {
    options
        .get(list_key)?
        .as_array()?
        .iter()
        .find(|entry| entry.get(REF_NAME_KEY).and_then(Value::as_str) == Some(ref_name))
        .and_then(|entry| entry.get(OPTIONS_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_empty_source_is_identity() {
        let target = json!({"a": 1, "b": {"c": [1, 2]}});
        assert_eq!(merge_options(&target, &json!({}), true), target);
        assert_eq!(merge_options(&target, &json!({}), false), target);
    }

    #[test]
    fn test_merge_scalar_conflict() {
        let target = json!({"x": 1, "keep": true});
        let source = json!({"x": 2});
        assert_eq!(
            merge_options(&target, &source, true),
            json!({"x": 2, "keep": true})
        );
        assert_eq!(
            merge_options(&target, &source, false),
            json!({"x": 1, "keep": true})
        );
    }

    #[test]
    fn test_merge_nested_objects() {
        let target = json!({"limits": {"low": 1, "high": 10}});
        let source = json!({"limits": {"high": 20, "step": 2}});
        assert_eq!(
            merge_options(&target, &source, true),
            json!({"limits": {"low": 1, "high": 20, "step": 2}})
        );
    }

    #[test]
    fn test_plain_arrays_are_scalars() {
        let target = json!({"tags": [1, 2]});
        let source = json!({"tags": [3]});
        assert_eq!(merge_options(&target, &source, true), json!({"tags": [3]}));
        assert_eq!(merge_options(&target, &source, false), json!({"tags": [1, 2]}));
    }

    #[test]
    fn test_override_lists_merge_by_ref_name() {
        let target = json!({
            RULE_OVERRIDES: [
                {"ref_name": "A", "options": {"x": 1}},
                {"ref_name": "B", "options": {"x": 1}}
            ]
        });
        let source = json!({
            RULE_OVERRIDES: [
                {"ref_name": "B", "options": {"x": 2}},
                {"ref_name": "C", "options": {"x": 3}}
            ]
        });
        assert_eq!(
            merge_options(&target, &source, true),
            json!({
                RULE_OVERRIDES: [
                    {"ref_name": "A", "options": {"x": 1}},
                    {"ref_name": "B", "options": {"x": 2}},
                    {"ref_name": "C", "options": {"x": 3}}
                ]
            })
        );
    }

    #[test]
    fn test_override_lists_nest() {
        let target = json!({
            RULE_SET_OVERRIDES: [
                {"ref_name": "S", "options": {RULE_OVERRIDES: [{"ref_name": "R", "options": {"x": 1}}]}}
            ]
        });
        let source = json!({
            RULE_SET_OVERRIDES: [
                {"ref_name": "S", "options": {RULE_OVERRIDES: [{"ref_name": "R", "options": {"x": 9}}]}}
            ]
        });
        let merged = merge_options(&target, &source, true);
        assert_eq!(
            override_for(
                override_for(&merged, RULE_SET_OVERRIDES, "S").unwrap(),
                RULE_OVERRIDES,
                "R"
            ),
            Some(&json!({"x": 9}))
        );
    }

    #[test]
    fn test_override_for_missing() {
        let options = json!({RULE_OVERRIDES: [{"ref_name": "A", "options": {}}]});
        assert!(override_for(&options, RULE_OVERRIDES, "B").is_none());
        assert!(override_for(&json!({}), RULE_OVERRIDES, "A").is_none());
    }

    #[test]
    fn test_global_defaults_is_empty_object() {
        assert_eq!(*global_defaults(), json!({}));
    }
}
