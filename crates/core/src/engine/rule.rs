use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::engine::condition::{ConditionEvaluator, TextConditionEvaluator};
use crate::engine::evaluation::Evaluation;
use crate::engine::ContainerError;
use crate::error::{CoreError, Result};
use crate::model::{RuleReference, RuleResult};
use crate::scope::{Helper, HelperKey, Scope};

/// The leaf evaluable unit: one named condition over the data domain.
#[derive(Debug)]
pub struct Rule {
    ref_name: String,
    scope: Scope,
    explicit_options: Value,
    condition: String,
}

impl Rule {
    pub fn new(ref_name: impl Into<String>, condition: impl Into<String>, scope: Scope) -> Self {
        Self {
            ref_name: ref_name.into(),
            scope,
            explicit_options: crate::options::empty_options(),
            condition: condition.into(),
        }
    }

    /// Binds the reference's `loaded_scope`, or the supplied scope when the
    /// reference carries none.
    pub fn from_reference(reference: &RuleReference, scope: Option<&Scope>) -> Result<Self> {
        let scope = reference
            .loaded_scope
            .clone()
            .or_else(|| scope.cloned())
            .ok_or_else(|| ContainerError::MissingScope {
                ref_name: reference.ref_name.clone(),
            })?;
        Ok(Self {
            ref_name: reference.ref_name.clone(),
            scope,
            explicit_options: reference.explicit_options.clone(),
            condition: reference.condition.clone(),
        })
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Evaluates the condition against `domain` through the evaluator the
    /// scope chain provides, falling back to the built-in text evaluator. An
    /// empty condition is vacuously valid.
    pub fn evaluate(&self, domain: &Value) -> Evaluation<'static, Result<RuleResult>> {
        let rule_ref = self.ref_name.clone();
        if self.condition.trim().is_empty() {
            return Evaluation::Ready(Ok(RuleResult::new(rule_ref, true)));
        }
        let evaluator: Rc<dyn ConditionEvaluator> =
            match self.scope.helper(HelperKey::ConditionEvaluator) {
                Some(Helper::ConditionEvaluator(evaluator)) => evaluator,
                _ => Rc::new(TextConditionEvaluator),
            };
        trace!(rule = %self.ref_name, condition = %self.condition, "evaluating rule");
        evaluator.evaluate(&self.condition, domain).map(move |outcome| {
            outcome
                .map(|valid| RuleResult::new(rule_ref, valid))
                .map_err(CoreError::from)
        })
    }

    /// Serializes current state back into a reference carrying this rule's
    /// live scope, for copy-construction.
    pub fn to_reference(&self) -> RuleReference {
        RuleReference {
            ref_name: self.ref_name.clone(),
            options: self.scope.options(),
            explicit_options: self.explicit_options.clone(),
            condition: self.condition.clone(),
            loaded_scope: Some(self.scope.clone()),
        }
    }
}
