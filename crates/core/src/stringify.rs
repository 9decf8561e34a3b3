//! Canonical rendering of reference trees back into hint-tagged source.
//!
//! A node renders as `<<tag name=X>>` (the name quoted only when it contains
//! a space), with a non-empty explicit options record rendered as
//! `options={compact json}`, followed by each child's rendering,
//! space-separated, in child order. Rule bodies follow the rule hint
//! verbatim. Parsing a rendering yields the original tree, modulo
//! default-name insertion for hints that omitted `name`.

use serde_json::Value;

use crate::hints::HintTag;
use crate::model::{ApplicationReference, RuleReference, RuleSetReference};

pub fn stringify_applications(applications: &[ApplicationReference]) -> String {
    applications
        .iter()
        .map(stringify_application)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn stringify_application(application: &ApplicationReference) -> String {
    let mut parts = vec![render_hint(
        &HintTag::Application,
        &application.ref_name,
        &application.explicit_options,
    )];
    parts.extend(application.rule_sets.iter().map(stringify_rule_set));
    parts.join(" ")
}

pub fn stringify_rule_set(rule_set: &RuleSetReference) -> String {
    let mut parts = vec![render_hint(
        &HintTag::RuleSet,
        &rule_set.ref_name,
        &rule_set.explicit_options,
    )];
    parts.extend(rule_set.rules.iter().map(stringify_rule));
    parts.join(" ")
}

pub fn stringify_rule(rule: &RuleReference) -> String {
    let hint = render_hint(&HintTag::Rule, &rule.ref_name, &rule.explicit_options);
    if rule.condition.is_empty() {
        hint
    } else {
        format!("{} {}", hint, rule.condition)
    }
}

fn render_hint(tag: &HintTag, name: &str, explicit_options: &Value) -> String {
    let mut hint = format!("<<{} name={}", tag, render_name(name));
    if explicit_options
        .as_object()
        .is_some_and(|options| !options.is_empty())
    {
        hint.push_str(&format!(" options={explicit_options}"));
    }
    hint.push_str(">>");
    hint
}

fn render_name(name: &str) -> String {
    if name.contains(' ') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}
