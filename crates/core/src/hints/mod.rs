//! Hint-marker tokenizer.
//!
//! Hint markers are `<<tag attr=value>>` delimiters in source text that mark
//! the start of a nested block. [`HintMarker::peek`] classifies the marker at
//! the start of a text without consuming it; [`HintMarker::take`] consumes it.

use indexmap::IndexMap;
use pest::Parser;
use pest_derive::Parser;
use serde_json::Value;

use crate::options::empty_options;
use crate::parser::{snippet, ParseError};

#[derive(Parser)]
#[grammar = "hints/grammar.pest"]
struct HintGrammar;

/// Attribute carrying the reference name of a block.
pub const NAME_ATTRIBUTE: &str = "name";
/// Attribute carrying a JSON object of explicit options for a block.
pub const OPTIONS_ATTRIBUTE: &str = "options";

/// The tag of a hint marker, one per nesting level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintTag {
    /// `re` - the rules-engine level, illegal at or below application scope.
    RulesEngine,
    /// `ap` - an application block.
    Application,
    /// `rs` - a rule-set block.
    RuleSet,
    /// `ru` - a rule block.
    Rule,
    /// Any tag no level claims.
    Unknown(String),
}

impl HintTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "re" => HintTag::RulesEngine,
            "ap" => HintTag::Application,
            "rs" => HintTag::RuleSet,
            "ru" => HintTag::Rule,
            other => HintTag::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HintTag::RulesEngine => "re",
            HintTag::Application => "ap",
            HintTag::RuleSet => "rs",
            HintTag::Rule => "ru",
            HintTag::Unknown(tag) => tag,
        }
    }
}

impl std::fmt::Display for HintTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hint marker found at the start of a text, with its attributes and the
/// byte length it occupies (leading whitespace included).
#[derive(Debug, Clone, PartialEq)]
pub struct HintMarker {
    tag: HintTag,
    attributes: IndexMap<String, String>,
    consumed: usize,
}

impl HintMarker {
    /// Classifies the hint marker at the start of `text` without consuming it.
    ///
    /// Returns `Ok(None)` when the text, after leading whitespace, does not
    /// start with `<<`. A text that starts with `<<` but carries no
    /// well-formed marker is an error.
    pub fn peek(text: &str) -> Result<Option<HintMarker>, ParseError> {
        let trimmed = text.trim_start();
        if !trimmed.starts_with("<<") {
            return Ok(None);
        }
        let offset = text.len() - trimmed.len();

        let mut pairs = HintGrammar::parse(Rule::marker, trimmed).map_err(|_| {
            if trimmed.contains(">>") {
                ParseError::MalformedHint {
                    near: snippet(trimmed),
                }
            } else {
                ParseError::UnterminatedHint {
                    near: snippet(trimmed),
                }
            }
        })?;
        let marker = pairs.next().ok_or_else(|| ParseError::Internal {
            message: "hint grammar produced no marker".to_string(),
        })?;
        let consumed = offset + marker.as_span().end();

        let mut tag = None;
        let mut attributes = IndexMap::new();
        for pair in marker.into_inner() {
            match pair.as_rule() {
                Rule::tag => tag = Some(HintTag::parse(pair.as_str())),
                Rule::attribute => {
                    let mut inner = pair.into_inner();
                    let key = inner
                        .next()
                        .ok_or_else(|| ParseError::Internal {
                            message: "attribute without key".to_string(),
                        })?
                        .as_str()
                        .to_string();
                    let value = inner
                        .next()
                        .and_then(|value| value.into_inner().next())
                        .ok_or_else(|| ParseError::Internal {
                            message: "attribute without value".to_string(),
                        })?;
                    let raw = match value.as_rule() {
                        Rule::quoted_value => {
                            let quoted = value.as_str();
                            quoted[1..quoted.len() - 1].to_string()
                        }
                        _ => value.as_str().to_string(),
                    };
                    attributes.insert(key, raw);
                }
                _ => {}
            }
        }
        let tag = tag.ok_or_else(|| ParseError::Internal {
            message: "hint marker without tag".to_string(),
        })?;

        Ok(Some(HintMarker {
            tag,
            attributes,
            consumed,
        }))
    }

    pub fn tag(&self) -> &HintTag {
        &self.tag
    }

    /// Raw attribute value, quotes already stripped. Unknown attributes are
    /// kept; each level's parser ignores the ones it does not understand.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute(NAME_ATTRIBUTE)
    }

    /// The explicit options record carried by the marker, an empty object
    /// when the attribute is absent.
    pub fn options(&self) -> Result<Value, ParseError> {
        let Some(raw) = self.attribute(OPTIONS_ATTRIBUTE) else {
            return Ok(empty_options());
        };
        let value: Value =
            serde_json::from_str(raw).map_err(|err| ParseError::InvalidOptions {
                near: snippet(raw),
                message: err.to_string(),
            })?;
        if !value.is_object() {
            return Err(ParseError::InvalidOptions {
                near: snippet(raw),
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(value)
    }

    /// Bytes the marker occupies at the start of the peeked text.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Consumes the peeked marker, returning the rest of the text.
    pub fn take<'a>(&self, text: &'a str) -> &'a str {
        &text[self.consumed..]
    }
}

/// Byte index of the next `<<` occurrence, used to delimit rule bodies.
pub fn next_marker_index(text: &str) -> Option<usize> {
    text.find("<<")
}
