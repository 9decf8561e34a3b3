//! Aggregate evaluation results.
//!
//! `valid` at each level is the AND of the child `valid` flags, true for an
//! empty container. Child result order always matches child insertion order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_ref: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetResult {
    pub rule_set_ref: String,
    pub rule_results: Vec<RuleResult>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResult {
    pub application_ref: String,
    pub rule_set_results: Vec<RuleSetResult>,
    pub valid: bool,
}

impl RuleResult {
    pub fn new(rule_ref: impl Into<String>, valid: bool) -> Self {
        Self {
            rule_ref: rule_ref.into(),
            valid,
        }
    }
}

impl RuleSetResult {
    pub fn new(rule_set_ref: impl Into<String>, rule_results: Vec<RuleResult>) -> Self {
        let valid = rule_results.iter().all(|result| result.valid);
        Self {
            rule_set_ref: rule_set_ref.into(),
            rule_results,
            valid,
        }
    }
}

impl ApplicationResult {
    pub fn new(application_ref: impl Into<String>, rule_set_results: Vec<RuleSetResult>) -> Self {
        let valid = rule_set_results.iter().all(|result| result.valid);
        Self {
            application_ref: application_ref.into(),
            rule_set_results,
            valid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_is_and_of_children() {
        let result = RuleSetResult::new(
            "S",
            vec![RuleResult::new("A", true), RuleResult::new("B", false)],
        );
        assert!(!result.valid);

        let application =
            ApplicationResult::new("App", vec![result, RuleSetResult::new("T", vec![])]);
        assert!(!application.valid);
    }

    #[test]
    fn test_empty_container_is_valid() {
        assert!(RuleSetResult::new("S", vec![]).valid);
        assert!(ApplicationResult::new("App", vec![]).valid);
    }
}
