use serde_json::Value;
use tracing::debug;

use crate::hints::{HintMarker, HintTag};
use crate::model::{RuleReference, RuleSetReference, DEFAULT_NAME};
use crate::options::{empty_options, RULE_SET_OVERRIDES};
use crate::scope::Scope;

use super::{
    block_scope, effective_options, snippet, ParseError, ParserMessages, ReferenceParser,
    RuleParser,
};

/// Parser for `rs` blocks. Content under a rule hint with no enclosing `rs`
/// hint lands in an implicit rule set named `Default`.
pub struct RuleSetParser;

impl ReferenceParser for RuleSetParser {
    type Reference = RuleSetReference;

    fn parse<'a>(
        &self,
        text: &'a str,
        inherited_options: &Value,
        parent_scope: Option<&Scope>,
    ) -> Result<(&'a str, Option<RuleSetReference>, ParserMessages), ParseError> {
        let mut messages = ParserMessages::new();
        let peeked = HintMarker::peek(text)?;

        let (mut remaining, ref_name, explicit_options, explicit) = match &peeked {
            Some(marker) if *marker.tag() == HintTag::RulesEngine => {
                return Err(ParseError::UnexpectedHint {
                    tag: marker.tag().as_str().to_string(),
                    near: snippet(text),
                });
            }
            Some(marker) if *marker.tag() == HintTag::Application => {
                // An enclosing level begins; hand control back untouched.
                return Ok((text, None, messages));
            }
            Some(marker) if *marker.tag() == HintTag::RuleSet => {
                let ref_name = marker.name().unwrap_or(DEFAULT_NAME).to_string();
                (marker.take(text), ref_name, marker.options()?, true)
            }
            _ => {
                if text.trim().is_empty() {
                    return Ok((text, None, messages));
                }
                (text, DEFAULT_NAME.to_string(), empty_options(), false)
            }
        };
        debug!(rule_set = %ref_name, explicit, "parsing rule set block");

        let inherited = super::inherited_options(inherited_options, parent_scope);
        let effective =
            effective_options(&inherited, &explicit_options, RULE_SET_OVERRIDES, &ref_name);
        let scope = block_scope(effective.clone(), parent_scope);

        let mut rules: Vec<RuleReference> = Vec::new();
        loop {
            if remaining.trim().is_empty() {
                break;
            }
            match HintMarker::peek(remaining)? {
                Some(marker) if *marker.tag() == HintTag::RulesEngine => {
                    return Err(ParseError::UnexpectedHint {
                        tag: marker.tag().as_str().to_string(),
                        near: snippet(remaining),
                    });
                }
                // A sibling rule set or the enclosing application begins.
                Some(marker) if *marker.tag() == HintTag::RuleSet => break,
                Some(marker) if *marker.tag() == HintTag::Application => break,
                _ => {}
            }
            let (rest, rule, rule_messages) =
                RuleParser.parse(remaining, &effective, Some(&scope))?;
            messages.extend(rule_messages);
            remaining = rest;
            let Some(rule) = rule else {
                break;
            };
            if rules.iter().any(|existing| existing.ref_name == rule.ref_name) {
                messages.warning(
                    format!("duplicate rule name '{}'", rule.ref_name),
                    snippet(remaining),
                );
            }
            rules.push(rule);
        }

        if !explicit && rules.is_empty() {
            return Ok((text, None, messages));
        }
        if !explicit {
            messages.info(format!("implicit rule set '{ref_name}'"), snippet(text));
        }
        let reference = RuleSetReference {
            ref_name,
            options: effective,
            explicit_options,
            rules,
            loaded_scope: Some(scope),
        };
        Ok((remaining, Some(reference), messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_rule_set_with_rules() {
        let (remaining, rule_set, _) = RuleSetParser
            .parse(
                "<<rs name=S1>> <<ru name=R1>> a = 1 <<ru name=R2>> b = 2",
                &json!({}),
                None,
            )
            .unwrap();
        let rule_set = rule_set.unwrap();
        assert_eq!(rule_set.ref_name, "S1");
        assert_eq!(remaining, "");
        let names: Vec<_> = rule_set.rules.iter().map(|r| r.ref_name.as_str()).collect();
        assert_eq!(names, ["R1", "R2"]);
    }

    #[test]
    fn test_implicit_rule_set_around_bare_rule() {
        let (_, rule_set, messages) = RuleSetParser
            .parse("<<ru name=R1>> a = 1", &json!({}), None)
            .unwrap();
        let rule_set = rule_set.unwrap();
        assert_eq!(rule_set.ref_name, DEFAULT_NAME);
        assert_eq!(rule_set.rules.len(), 1);
        assert!(!messages.is_empty());
    }

    #[test]
    fn test_stops_at_sibling_rule_set() {
        let (remaining, rule_set, _) = RuleSetParser
            .parse("<<ru name=R1>> a = 1 <<rs name=S2>>", &json!({}), None)
            .unwrap();
        assert_eq!(rule_set.unwrap().rules.len(), 1);
        assert_eq!(remaining, "<<rs name=S2>>");
    }

    #[test]
    fn test_empty_explicit_rule_set_is_kept() {
        let (_, rule_set, _) = RuleSetParser.parse("<<rs name=S>>", &json!({}), None).unwrap();
        assert_eq!(rule_set.unwrap().rules.len(), 0);
    }

    #[test]
    fn test_nothing_claimable_consumes_nothing() {
        let (remaining, rule_set, _) =
            RuleSetParser.parse("plain text", &json!({}), None).unwrap();
        assert!(rule_set.is_none());
        assert_eq!(remaining, "plain text");
    }

    #[test]
    fn test_duplicate_rule_names_warn_but_parse() {
        let (_, rule_set, messages) = RuleSetParser
            .parse("<<rs name=S>> <<ru name=R>> a = 1 <<ru name=R>> b = 2", &json!({}), None)
            .unwrap();
        assert_eq!(rule_set.unwrap().rules.len(), 2);
        assert!(messages.has_warnings());
    }

    #[test]
    fn test_rules_engine_tag_is_illegal() {
        assert!(matches!(
            RuleSetParser.parse("<<re>> <<rs>>", &json!({}), None),
            Err(ParseError::UnexpectedHint { .. })
        ));
    }

    #[test]
    fn test_rule_set_override_applies() {
        let inherited = json!({
            "x": 1,
            RULE_SET_OVERRIDES: [{"ref_name": "B", "options": {"x": 2}}]
        });
        let (_, rule_set, _) = RuleSetParser
            .parse("<<rs name=B>> <<ru name=R>>", &inherited, None)
            .unwrap();
        assert_eq!(rule_set.unwrap().options["x"], 2);
    }
}
