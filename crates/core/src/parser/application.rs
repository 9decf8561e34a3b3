use serde_json::Value;
use tracing::debug;

use crate::hints::{HintMarker, HintTag};
use crate::model::{ApplicationReference, RuleSetReference, DEFAULT_NAME};
use crate::options::{empty_options, APPLICATION_OVERRIDES};
use crate::scope::Scope;

use super::{
    block_scope, effective_options, snippet, ParseError, ParserMessages, ReferenceParser,
    RuleSetParser,
};

/// Parser for `ap` blocks, the top level of the reference tree. Source text
/// that starts below application level lands in an implicit application
/// named `Default`.
pub struct ApplicationParser;

impl ReferenceParser for ApplicationParser {
    type Reference = ApplicationReference;

    fn parse<'a>(
        &self,
        text: &'a str,
        inherited_options: &Value,
        parent_scope: Option<&Scope>,
    ) -> Result<(&'a str, Option<ApplicationReference>, ParserMessages), ParseError> {
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
        debug!(application = %ref_name, explicit, "parsing application block");

        let inherited = super::inherited_options(inherited_options, parent_scope);
        let effective =
            effective_options(&inherited, &explicit_options, APPLICATION_OVERRIDES, &ref_name);
        let scope = block_scope(effective.clone(), parent_scope);

        let mut rule_sets: Vec<RuleSetReference> = Vec::new();
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
                // A sibling application begins; hand control back.
                Some(marker) if *marker.tag() == HintTag::Application => break,
                _ => {}
            }
            let (rest, rule_set, rule_set_messages) =
                RuleSetParser.parse(remaining, &effective, Some(&scope))?;
            messages.extend(rule_set_messages);
            remaining = rest;
            let Some(rule_set) = rule_set else {
                break;
            };
            if rule_sets
                .iter()
                .any(|existing| existing.ref_name == rule_set.ref_name)
            {
                messages.warning(
                    format!("duplicate rule set name '{}'", rule_set.ref_name),
                    snippet(remaining),
                );
            }
            rule_sets.push(rule_set);
        }

        if !explicit && rule_sets.is_empty() {
            return Ok((text, None, messages));
        }
        if !explicit {
            messages.info(format!("implicit application '{ref_name}'"), snippet(text));
        }
        let reference = ApplicationReference {
            ref_name,
            options: effective,
            explicit_options,
            rule_sets,
            loaded_scope: Some(scope),
        };
        Ok((remaining, Some(reference), messages))
    }
}
