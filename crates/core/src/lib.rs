//! rulekit-core: a composition layer for textual validation rules.
//!
//! Rule sources are plain text interleaved with hint markers such as
//! `<<rs name=Checks>>`. The parser turns a source into a tree of
//! references (applications containing rule sets containing rules),
//! inserting implicit `Default` containers where the text starts without
//! one. Each reference carries effective options merged down the tree
//! through parent-linked scopes, and converts into a runtime container
//! that evaluates its rule conditions against a domain record, either
//! immediately or as a pending computation.

pub mod engine;
pub mod error;
pub mod hints;
pub mod model;
pub mod options;
pub mod parser;
pub mod scope;
pub mod stringify;

pub use engine::condition::{
    evaluate_condition, ConditionError, ConditionEvaluator, TextConditionEvaluator,
};
pub use engine::evaluation::{join_evaluations, Evaluation};
pub use engine::{Application, ContainerError, ElementRegistry, Rule, RuleSet};
pub use error::{CoreError, Result};
pub use hints::{HintMarker, HintTag};
pub use model::{
    ApplicationReference, ApplicationResult, RuleReference, RuleResult, RuleSetReference,
    RuleSetResult, DEFAULT_NAME,
};
pub use options::merge_options;
pub use parser::{
    parse_applications, ParseError, ParserMessage, ParserMessages, ReferenceParser, Severity,
};
pub use scope::{Helper, HelperKey, Scope, ScopeError, ScopeLoader};
pub use stringify::{
    stringify_application, stringify_applications, stringify_rule, stringify_rule_set,
};
