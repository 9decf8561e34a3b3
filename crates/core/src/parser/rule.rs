use serde_json::Value;
use tracing::trace;

use crate::hints::{next_marker_index, HintMarker, HintTag};
use crate::model::{RuleReference, DEFAULT_NAME};
use crate::options::RULE_OVERRIDES;
use crate::scope::Scope;

use super::{
    block_scope, effective_options, snippet, ParseError, ParserMessages, ReferenceParser,
};

/// Parser for `ru` blocks, the leaf level.
///
/// A rule is never implicit: without a `ru` hint there is no rule, and plain
/// text at rule position is returned untouched as enclosing-body content. A
/// tag no level claims surfaces here, at the deepest position.
pub struct RuleParser;

impl ReferenceParser for RuleParser {
    type Reference = RuleReference;

    fn parse<'a>(
        &self,
        text: &'a str,
        inherited_options: &Value,
        parent_scope: Option<&Scope>,
    ) -> Result<(&'a str, Option<RuleReference>, ParserMessages), ParseError> {
        let messages = ParserMessages::new();
        let Some(marker) = HintMarker::peek(text)? else {
            return Ok((text, None, messages));
        };
        match marker.tag() {
            HintTag::Application | HintTag::RuleSet => return Ok((text, None, messages)),
            HintTag::RulesEngine | HintTag::Unknown(_) => {
                return Err(ParseError::UnexpectedHint {
                    tag: marker.tag().as_str().to_string(),
                    near: snippet(text),
                });
            }
            HintTag::Rule => {}
        }

        let ref_name = marker.name().unwrap_or(DEFAULT_NAME).to_string();
        let explicit_options = marker.options()?;
        let after = marker.take(text);
        let (condition, remaining) = match next_marker_index(after) {
            Some(index) => (&after[..index], &after[index..]),
            None => (after, &after[after.len()..]),
        };
        let condition = condition.trim().to_string();

        let inherited = super::inherited_options(inherited_options, parent_scope);
        let effective = effective_options(&inherited, &explicit_options, RULE_OVERRIDES, &ref_name);
        let scope = block_scope(effective.clone(), parent_scope);
        trace!(rule = %ref_name, condition = %condition, "parsed rule block");

        let reference = RuleReference {
            ref_name,
            options: effective,
            explicit_options,
            condition,
            loaded_scope: Some(scope),
        };
        Ok((remaining, Some(reference), messages))
    }
}
