//! Recursive hint-driven reference parsers.
//!
//! One parser per level (application, rule set, rule), all sharing one
//! contract: consume the level's opening hint (or begin an implicit block),
//! build the level's scope by merging inherited and overridden options,
//! delegate nested content to the next-level parser until a sibling or
//! enclosing tag appears, and return the remaining text verbatim together
//! with the built reference and any diagnostic messages. Leftover non-hint
//! text is never dropped; it belongs to the enclosing evaluable unit's body.

mod application;
mod error;
mod rule;
mod rule_set;

pub use application::ApplicationParser;
pub use error::ParseError;
pub use rule::RuleParser;
pub use rule_set::RuleSetParser;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::model::ApplicationReference;
use crate::options::{global_defaults, merge_options, override_for};
use crate::scope::Scope;

/// Diagnostic severity for non-fatal parser findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserMessage {
    pub severity: Severity,
    pub message: String,
    /// The source text the finding is about, truncated.
    pub near: String,
}

/// Ordered diagnostics collected across one parse call and its delegates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParserMessages(Vec<ParserMessage>);

impl ParserMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>, near: impl Into<String>) {
        self.0.push(ParserMessage {
            severity: Severity::Info,
            message: message.into(),
            near: near.into(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>, near: impl Into<String>) {
        self.0.push(ParserMessage {
            severity: Severity::Warning,
            message: message.into(),
            near: near.into(),
        });
    }

    pub fn extend(&mut self, other: ParserMessages) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserMessage> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_warnings(&self) -> bool {
        self.0
            .iter()
            .any(|message| message.severity == Severity::Warning)
    }
}

/// Uniform per-level parser contract.
///
/// `parse` returns the remaining text, the built reference (or `None` when
/// the text starts with a sibling/enclosing tag or holds nothing this level
/// can claim; nothing is consumed in that case), and diagnostics.
pub trait ReferenceParser {
    type Reference;

    fn parse<'a>(
        &self,
        text: &'a str,
        inherited_options: &Value,
        parent_scope: Option<&Scope>,
    ) -> Result<(&'a str, Option<Self::Reference>, ParserMessages), ParseError>;
}

/// Parses every sibling application in `source`, failing on leftover text no
/// parser claims.
pub fn parse_applications(
    source: &str,
    options: &Value,
) -> Result<(Vec<ApplicationReference>, ParserMessages), ParseError> {
    let parser = ApplicationParser;
    let mut applications: Vec<ApplicationReference> = Vec::new();
    let mut messages = ParserMessages::new();
    let mut remaining = source;
    loop {
        let (rest, application, round_messages) = parser.parse(remaining, options, None)?;
        messages.extend(round_messages);
        remaining = rest;
        match application {
            Some(application) => {
                if applications
                    .iter()
                    .any(|existing| existing.ref_name == application.ref_name)
                {
                    messages.warning(
                        format!("duplicate application name '{}'", application.ref_name),
                        snippet(remaining),
                    );
                }
                applications.push(application);
            }
            None => {
                if remaining.trim().is_empty() {
                    break;
                }
                warn!(near = %snippet(remaining), "leftover source text no parser claims");
                return Err(ParseError::UnexpectedContent {
                    near: snippet(remaining),
                });
            }
        }
        if remaining.trim().is_empty() {
            break;
        }
    }
    Ok((applications, messages))
}

/// Truncated view of source text for diagnostics.
pub(crate) fn snippet(text: &str) -> String {
    const LIMIT: usize = 40;
    let trimmed = text.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        trimmed.chars().take(LIMIT).collect()
    }
}

/// Options a block inherits: the parent scope's resolved options when a
/// parent exists, the caller-supplied top-level options otherwise.
pub(crate) fn inherited_options(supplied: &Value, parent_scope: Option<&Scope>) -> Value {
    match parent_scope {
        Some(parent) => parent.options(),
        None => supplied.clone(),
    }
}

/// Layered effective options for one block: global defaults, inherited
/// options, the hint's explicit options, then the inherited side's override
/// entry targeting `ref_name`, lowest to highest precedence.
pub(crate) fn effective_options(
    inherited: &Value,
    explicit: &Value,
    overrides_key: &str,
    ref_name: &str,
) -> Value {
    let mut effective = merge_options(global_defaults(), inherited, true);
    effective = merge_options(&effective, explicit, true);
    if let Some(entry) = override_for(inherited, overrides_key, ref_name) {
        effective = merge_options(&effective, entry, true);
    }
    effective
}

/// Scope for a freshly parsed block, parented when the block has an
/// enclosing one.
pub(crate) fn block_scope(options: Value, parent_scope: Option<&Scope>) -> Scope {
    match parent_scope {
        Some(parent) => Scope::with_parent(options, parent),
        None => Scope::new(options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "x".repeat(80);
        assert_eq!(snippet(&long).chars().count(), 40);
        assert_eq!(snippet("  short  "), "short");
    }

    #[test]
    fn test_effective_options_precedence() {
        let inherited = json!({
            "x": 1,
            "y": 1,
            "z": 1,
            "rule_overrides": [{"ref_name": "R", "options": {"z": 3}}]
        });
        let explicit = json!({"y": 2, "z": 2});
        let effective = effective_options(&inherited, &explicit, "rule_overrides", "R");
        assert_eq!(effective["x"], 1);
        assert_eq!(effective["y"], 2);
        assert_eq!(effective["z"], 3);
    }

    #[test]
    fn test_inherited_options_prefers_parent_scope() {
        let parent = Scope::new(json!({"from": "scope"}));
        assert_eq!(
            inherited_options(&json!({"from": "supplied"}), Some(&parent)),
            json!({"from": "scope"})
        );
        assert_eq!(
            inherited_options(&json!({"from": "supplied"}), None),
            json!({"from": "supplied"})
        );
    }
}
