//! Parsed, not-yet-executable descriptions of one node each.
//!
//! A reference records its effective options (the layered merge computed at
//! parse time), the raw explicit options its hint carried (kept so the
//! stringifier can round-trip them), and its children in source order.
//! `loaded_scope` is a live scope attached by the parser or by
//! `to_reference()` on a running container; it short-circuits fresh scope
//! construction and is never serialized.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::options::empty_options;
use crate::scope::Scope;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReference {
    pub ref_name: String,
    #[serde(default = "crate::options::empty_options")]
    pub options: Value,
    #[serde(default = "crate::options::empty_options")]
    pub explicit_options: Value,
    #[serde(default)]
    pub rule_sets: Vec<RuleSetReference>,
    #[serde(skip)]
    pub loaded_scope: Option<Scope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetReference {
    pub ref_name: String,
    #[serde(default = "crate::options::empty_options")]
    pub options: Value,
    #[serde(default = "crate::options::empty_options")]
    pub explicit_options: Value,
    #[serde(default)]
    pub rules: Vec<RuleReference>,
    #[serde(skip)]
    pub loaded_scope: Option<Scope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleReference {
    pub ref_name: String,
    #[serde(default = "crate::options::empty_options")]
    pub options: Value,
    #[serde(default = "crate::options::empty_options")]
    pub explicit_options: Value,
    /// Verbatim (trimmed) body text between the rule hint and the next
    /// marker; consumed by the rule's condition evaluator.
    #[serde(default)]
    pub condition: String,
    #[serde(skip)]
    pub loaded_scope: Option<Scope>,
}

impl ApplicationReference {
    pub fn new(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            options: empty_options(),
            explicit_options: empty_options(),
            rule_sets: Vec::new(),
            loaded_scope: None,
        }
    }
}

impl RuleSetReference {
    pub fn new(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            options: empty_options(),
            explicit_options: empty_options(),
            rules: Vec::new(),
            loaded_scope: None,
        }
    }
}

impl RuleReference {
    pub fn new(ref_name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            options: empty_options(),
            explicit_options: empty_options(),
            condition: condition.into(),
            loaded_scope: None,
        }
    }
}

// Scope identity is not part of reference equality: two references are equal
// when they describe the same tree, wherever their scopes live.
impl PartialEq for ApplicationReference {
    fn eq(&self, other: &Self) -> bool {
        self.ref_name == other.ref_name
            && self.options == other.options
            && self.explicit_options == other.explicit_options
            && self.rule_sets == other.rule_sets
    }
}

impl PartialEq for RuleSetReference {
    fn eq(&self, other: &Self) -> bool {
        self.ref_name == other.ref_name
            && self.options == other.options
            && self.explicit_options == other.explicit_options
            && self.rules == other.rules
    }
}

impl PartialEq for RuleReference {
    fn eq(&self, other: &Self) -> bool {
        self.ref_name == other.ref_name
            && self.options == other.options
            && self.explicit_options == other.explicit_options
            && self.condition == other.condition
    }
}
