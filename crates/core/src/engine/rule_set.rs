use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::engine::evaluation::{join_evaluations, Evaluation};
use crate::engine::{ContainerError, ElementRegistry, Rule};
use crate::error::Result;
use crate::model::{RuleReference, RuleSetReference, RuleSetResult};
use crate::options::{merge_options, override_for, RULE_OVERRIDES};
use crate::scope::Scope;

/// Runtime counterpart of a [`RuleSetReference`]: a scope plus a name-keyed,
/// insertion-ordered collection of rules.
#[derive(Debug)]
pub struct RuleSet {
    ref_name: String,
    scope: Scope,
    explicit_options: Value,
    rules: IndexMap<String, Rule>,
}

impl RuleSet {
    pub fn new(ref_name: impl Into<String>, scope: Scope) -> Self {
        Self {
            ref_name: ref_name.into(),
            scope,
            explicit_options: crate::options::empty_options(),
            rules: IndexMap::new(),
        }
    }

    /// Binds the reference's `loaded_scope` (or the supplied scope) and
    /// registers each rule child through [`RuleSet::add_rule`]. Children
    /// without a loaded scope get a fresh one from this set's options merged
    /// with the child's options and any matching `rule_overrides` entry.
    pub fn from_reference(reference: &RuleSetReference, scope: Option<&Scope>) -> Result<Self> {
        let scope = reference
            .loaded_scope
            .clone()
            .or_else(|| scope.cloned())
            .ok_or_else(|| ContainerError::MissingScope {
                ref_name: reference.ref_name.clone(),
            })?;
        debug!(rule_set = %reference.ref_name, rules = reference.rules.len(), "constructing rule set");
        let mut rule_set = Self {
            ref_name: reference.ref_name.clone(),
            scope,
            explicit_options: reference.explicit_options.clone(),
            rules: IndexMap::new(),
        };
        for rule_reference in &reference.rules {
            let rule = if rule_reference.loaded_scope.is_some() {
                Rule::from_reference(rule_reference, None)?
            } else {
                let child_scope = Scope::new(rule_set.child_options(rule_reference));
                Rule::from_reference(rule_reference, Some(&child_scope))?
            };
            rule_set.add_rule(rule)?;
        }
        Ok(rule_set)
    }

    fn child_options(&self, reference: &RuleReference) -> Value {
        let own = self.scope.options();
        let merged = merge_options(&own, &reference.options, true);
        match override_for(&own, RULE_OVERRIDES, &reference.ref_name) {
            Some(entry) => merge_options(&merged, entry, true),
            None => merged,
        }
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Registers a rule under its name and reparents its scope to this set's
    /// scope. Both happen or neither: a duplicate name fails before any
    /// scope mutation, and a failed reparent leaves the store untouched.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        if self.rules.contains_key(rule.ref_name()) {
            return Err(ContainerError::DuplicateName {
                container: self.ref_name.clone(),
                ref_name: rule.ref_name().to_string(),
            }
            .into());
        }
        rule.scope().reparent(&self.scope)?;
        self.rules.insert(rule.ref_name().to_string(), rule);
        Ok(())
    }

    /// Detaches the rule's scope and removes it; `false` when absent.
    pub fn remove_rule(&mut self, ref_name: &str) -> bool {
        match self.rules.shift_remove(ref_name) {
            Some(rule) => {
                rule.scope().remove_parent();
                true
            }
            None => false,
        }
    }

    pub fn get_rule(&self, ref_name: &str) -> Option<&Rule> {
        self.rules.get(ref_name)
    }

    pub fn get_rule_mut(&mut self, ref_name: &str) -> Option<&mut Rule> {
        self.rules.get_mut(ref_name)
    }

    pub fn has_rule(&self, ref_name: &str) -> bool {
        self.rules.contains_key(ref_name)
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn find_first_rule(&self, ref_name: &str) -> Option<&Rule> {
        self.rules.get(ref_name)
    }

    /// Evaluates every rule in insertion order and aggregates the results.
    /// Immediate when every rule is immediate; pending otherwise, with all
    /// pending rules driven together.
    pub fn evaluate<'a>(&'a self, domain: &'a Value) -> Evaluation<'a, Result<RuleSetResult>> {
        debug!(rule_set = %self.ref_name, rules = self.rules.len(), "evaluating rule set");
        let evaluations: Vec<_> = self
            .rules
            .values()
            .map(|rule| rule.evaluate(domain))
            .collect();
        let rule_set_ref = self.ref_name.clone();
        join_evaluations(evaluations).map(move |results| {
            results.map(|rule_results| RuleSetResult::new(rule_set_ref, rule_results))
        })
    }

    /// Serializes current state back into a reference carrying this set's
    /// live scope, for copy-construction.
    pub fn to_reference(&self) -> RuleSetReference {
        RuleSetReference {
            ref_name: self.ref_name.clone(),
            options: self.scope.options(),
            explicit_options: self.explicit_options.clone(),
            rules: self.rules.values().map(Rule::to_reference).collect(),
            loaded_scope: Some(self.scope.clone()),
        }
    }
}

impl ElementRegistry for RuleSet {
    type Element = Rule;

    fn register(&mut self, _element: Rule) -> Result<()> {
        Err(ContainerError::UnsupportedOperation {
            op: "register",
            use_instead: "add_rule",
        }
        .into())
    }

    fn unregister(&mut self, _ref_name: &str) -> Result<Rule> {
        Err(ContainerError::UnsupportedOperation {
            op: "unregister",
            use_instead: "remove_rule",
        }
        .into())
    }

    fn get_registered(&self, _ref_name: &str) -> Result<&Rule> {
        Err(ContainerError::UnsupportedOperation {
            op: "get_registered",
            use_instead: "get_rule",
        }
        .into())
    }
}
