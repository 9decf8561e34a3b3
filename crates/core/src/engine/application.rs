use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::engine::evaluation::{join_evaluations, Evaluation};
use crate::engine::{ContainerError, ElementRegistry, Rule, RuleSet};
use crate::error::Result;
use crate::model::{ApplicationReference, ApplicationResult, RuleSetReference};
use crate::options::{merge_options, override_for, RULE_SET_OVERRIDES};
use crate::parser::{snippet, ApplicationParser, ParseError, ReferenceParser};
use crate::scope::Scope;

/// Runtime counterpart of an [`ApplicationReference`]: a scope plus a
/// name-keyed, insertion-ordered collection of rule sets.
#[derive(Debug)]
pub struct Application {
    ref_name: String,
    scope: Scope,
    explicit_options: Value,
    rule_sets: IndexMap<String, RuleSet>,
}

impl Application {
    pub fn new(ref_name: impl Into<String>, scope: Scope) -> Self {
        Self {
            ref_name: ref_name.into(),
            scope,
            explicit_options: crate::options::empty_options(),
            rule_sets: IndexMap::new(),
        }
    }

    /// Binds the reference's `loaded_scope` (or the supplied scope) and
    /// registers each rule-set child through [`Application::add_rule_set`].
    /// Children without a loaded scope get a fresh one from this
    /// application's options merged with the child's options and any
    /// matching `rule_set_overrides` entry.
    pub fn from_reference(reference: &ApplicationReference, scope: Option<&Scope>) -> Result<Self> {
        let scope = reference
            .loaded_scope
            .clone()
            .or_else(|| scope.cloned())
            .ok_or_else(|| ContainerError::MissingScope {
                ref_name: reference.ref_name.clone(),
            })?;
        debug!(
            application = %reference.ref_name,
            rule_sets = reference.rule_sets.len(),
            "constructing application"
        );
        let mut application = Self {
            ref_name: reference.ref_name.clone(),
            scope,
            explicit_options: reference.explicit_options.clone(),
            rule_sets: IndexMap::new(),
        };
        for rule_set_reference in &reference.rule_sets {
            let rule_set = if rule_set_reference.loaded_scope.is_some() {
                RuleSet::from_reference(rule_set_reference, None)?
            } else {
                let child_scope = Scope::new(application.child_options(rule_set_reference));
                RuleSet::from_reference(rule_set_reference, Some(&child_scope))?
            };
            application.add_rule_set(rule_set)?;
        }
        Ok(application)
    }

    fn child_options(&self, reference: &RuleSetReference) -> Value {
        let own = self.scope.options();
        let merged = merge_options(&own, &reference.options, true);
        match override_for(&own, RULE_SET_OVERRIDES, &reference.ref_name) {
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

    /// Registers a rule set under its name and reparents its scope to this
    /// application's scope. Both happen or neither.
    pub fn add_rule_set(&mut self, rule_set: RuleSet) -> Result<()> {
        if self.rule_sets.contains_key(rule_set.ref_name()) {
            return Err(ContainerError::DuplicateName {
                container: self.ref_name.clone(),
                ref_name: rule_set.ref_name().to_string(),
            }
            .into());
        }
        rule_set.scope().reparent(&self.scope)?;
        self.rule_sets
            .insert(rule_set.ref_name().to_string(), rule_set);
        Ok(())
    }

    /// Detaches the rule set's scope and removes it; `false` when absent.
    pub fn remove_rule_set(&mut self, ref_name: &str) -> bool {
        match self.rule_sets.shift_remove(ref_name) {
            Some(rule_set) => {
                rule_set.scope().remove_parent();
                true
            }
            None => false,
        }
    }

    pub fn get_rule_set(&self, ref_name: &str) -> Option<&RuleSet> {
        self.rule_sets.get(ref_name)
    }

    pub fn get_rule_set_mut(&mut self, ref_name: &str) -> Option<&mut RuleSet> {
        self.rule_sets.get_mut(ref_name)
    }

    pub fn has_rule_set(&self, ref_name: &str) -> bool {
        self.rule_sets.contains_key(ref_name)
    }

    /// Rule sets in insertion order.
    pub fn rule_sets(&self) -> impl Iterator<Item = &RuleSet> {
        self.rule_sets.values()
    }

    /// Depth-first search across rule sets in insertion order; first match
    /// wins.
    pub fn find_first_rule(&self, ref_name: &str) -> Option<&Rule> {
        self.rule_sets
            .values()
            .find_map(|rule_set| rule_set.find_first_rule(ref_name))
    }

    /// Evaluates every rule set in insertion order and aggregates the
    /// results. Immediate when every child is immediate; pending otherwise,
    /// with all pending children driven together.
    pub fn evaluate<'a>(&'a self, domain: &'a Value) -> Evaluation<'a, Result<ApplicationResult>> {
        debug!(
            application = %self.ref_name,
            rule_sets = self.rule_sets.len(),
            "evaluating application"
        );
        let evaluations: Vec<_> = self
            .rule_sets
            .values()
            .map(|rule_set| rule_set.evaluate(domain))
            .collect();
        let application_ref = self.ref_name.clone();
        join_evaluations(evaluations).map(move |results| {
            results.map(|rule_set_results| ApplicationResult::new(application_ref, rule_set_results))
        })
    }

    /// Serializes current state back into a reference carrying this
    /// application's live scope, for copy-construction.
    pub fn to_reference(&self) -> ApplicationReference {
        ApplicationReference {
            ref_name: self.ref_name.clone(),
            options: self.scope.options(),
            explicit_options: self.explicit_options.clone(),
            rule_sets: self.rule_sets.values().map(RuleSet::to_reference).collect(),
            loaded_scope: Some(self.scope.clone()),
        }
    }

    /// Parses one application from `text`, resolves its scope, constructs it
    /// and evaluates it against `domain`. Immediate when nothing along the
    /// way defers.
    pub fn execute_source<'a>(
        text: &'a str,
        domain: &'a Value,
        options: &Value,
    ) -> Evaluation<'a, Result<ApplicationResult>> {
        let reference = match parse_single(text, options) {
            Ok(reference) => reference,
            Err(err) => return Evaluation::Ready(Err(err)),
        };
        let scope = match &reference.loaded_scope {
            Some(scope) => scope.clone(),
            None => {
                return Evaluation::Ready(Err(ContainerError::MissingScope {
                    ref_name: reference.ref_name.clone(),
                }
                .into()))
            }
        };
        match scope.resolve() {
            Evaluation::Ready(Err(err)) => Evaluation::Ready(Err(err)),
            Evaluation::Ready(Ok(())) => construct_and_evaluate(reference, domain),
            Evaluation::Deferred(resolution) => Evaluation::deferred(async move {
                resolution.await?;
                construct_and_evaluate(reference, domain).settle().await
            }),
        }
    }
}

fn parse_single(text: &str, options: &Value) -> Result<ApplicationReference> {
    let (_, reference, _) = ApplicationParser.parse(text, options, None)?;
    Ok(reference.ok_or_else(|| ParseError::MissingReference {
        near: snippet(text),
    })?)
}

fn construct_and_evaluate(
    reference: ApplicationReference,
    domain: &Value,
) -> Evaluation<'_, Result<ApplicationResult>> {
    let application = match Application::from_reference(&reference, None) {
        Ok(application) => application,
        Err(err) => return Evaluation::Ready(Err(err)),
    };
    // The deferred future borrows the application, which must move into the
    // returned evaluation; let the unpolled pass die in this block and
    // re-issue from a future that owns the container. Evaluators do their
    // work on poll, so nothing ran twice.
    {
        let first_pass = application.evaluate(domain);
        if let Evaluation::Ready(result) = first_pass {
            return Evaluation::Ready(result);
        }
    }
    Evaluation::deferred(async move { application.evaluate(domain).settle().await })
}

impl ElementRegistry for Application {
    type Element = RuleSet;

    fn register(&mut self, _element: RuleSet) -> Result<()> {
        Err(ContainerError::UnsupportedOperation {
            op: "register",
            use_instead: "add_rule_set",
        }
        .into())
    }

    fn unregister(&mut self, _ref_name: &str) -> Result<RuleSet> {
        Err(ContainerError::UnsupportedOperation {
            op: "unregister",
            use_instead: "remove_rule_set",
        }
        .into())
    }

    fn get_registered(&self, _ref_name: &str) -> Result<&RuleSet> {
        Err(ContainerError::UnsupportedOperation {
            op: "get_registered",
            use_instead: "get_rule_set",
        }
        .into())
    }
}
