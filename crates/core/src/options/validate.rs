//! Structural validation of options records.
//!
//! Validation never fails hard: issues are collected and reported so a
//! caller (the CLI `check` command) can surface all of them at once.

use serde::Serialize;
use serde_json::Value;

use super::{APPLICATION_OVERRIDES, OPTIONS_KEY, REF_NAME_KEY, RULE_OVERRIDES, RULE_SET_OVERRIDES};

const OVERRIDE_LIST_KEYS: [&str; 3] = [APPLICATION_OVERRIDES, RULE_SET_OVERRIDES, RULE_OVERRIDES];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON-pointer-like path to the offending field.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Checks the structure of an options record: the record is an object, every
/// `*_overrides` field is an array of objects with a non-empty string
/// `ref_name` and an optional object `options`, recursively.
pub fn validate_options(options: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !options.is_object() {
        issues.push(ValidationIssue::new("$", "options record must be a JSON object"));
        return issues;
    }
    validate_record(options, "$", &mut issues);
    issues
}

fn validate_record(record: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    for key in OVERRIDE_LIST_KEYS {
        let Some(list) = record.get(key) else { continue };
        let list_path = format!("{path}.{key}");
        let Some(entries) = list.as_array() else {
            issues.push(ValidationIssue::new(list_path, "override list must be an array"));
            continue;
        };
        for (index, entry) in entries.iter().enumerate() {
            validate_entry(entry, &format!("{list_path}[{index}]"), issues);
        }
    }
}

fn validate_entry(entry: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    if !entry.is_object() {
        issues.push(ValidationIssue::new(path, "override entry must be an object"));
        return;
    }
    match entry.get(REF_NAME_KEY).and_then(Value::as_str) {
        Some("") => issues.push(ValidationIssue::new(
            format!("{path}.{REF_NAME_KEY}"),
            "ref_name must not be empty",
        )),
        Some(_) => {}
        None => issues.push(ValidationIssue::new(
            format!("{path}.{REF_NAME_KEY}"),
            "override entry must carry a string ref_name",
        )),
    }
    if let Some(options) = entry.get(OPTIONS_KEY) {
        if options.is_object() {
            validate_record(options, &format!("{path}.{OPTIONS_KEY}"), issues);
        } else {
            issues.push(ValidationIssue::new(
                format!("{path}.{OPTIONS_KEY}"),
                "override options must be an object",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_record() {
        let options = json!({
            "threshold": 5,
            RULE_SET_OVERRIDES: [
                {"ref_name": "S", "options": {RULE_OVERRIDES: [{"ref_name": "R", "options": {}}]}}
            ]
        });
        assert!(validate_options(&options).is_empty());
    }

    #[test]
    fn test_non_object_record() {
        let issues = validate_options(&json!([1, 2]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "$");
    }

    #[test]
    fn test_override_list_not_array() {
        let issues = validate_options(&json!({RULE_OVERRIDES: {"ref_name": "A"}}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "$.rule_overrides");
    }

    #[test]
    fn test_entry_missing_ref_name() {
        let issues = validate_options(&json!({RULE_OVERRIDES: [{"options": {}}]}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "$.rule_overrides[0].ref_name");
    }

    #[test]
    fn test_nested_issue_path() {
        let options = json!({
            RULE_SET_OVERRIDES: [
                {"ref_name": "S", "options": {RULE_OVERRIDES: [{"ref_name": ""}]}}
            ]
        });
        let issues = validate_options(&options);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].path,
            "$.rule_set_overrides[0].options.rule_overrides[0].ref_name"
        );
    }

    #[test]
    fn test_non_object_entry_options() {
        let issues = validate_options(&json!({APPLICATION_OVERRIDES: [{"ref_name": "A", "options": 5}]}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "$.application_overrides[0].options");
    }
}
