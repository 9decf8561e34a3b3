//! Configuration scopes.
//!
//! A [`Scope`] is a node in a parent-linked configuration tree. It owns a
//! resolved options record and a local map of named helper objects; helper
//! lookup not satisfied locally delegates upward. The parent link is a weak
//! back reference, so scope trees never form cyclic ownership.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use thiserror::Error;

use crate::engine::condition::ConditionEvaluator;
use crate::engine::evaluation::Evaluation;
use crate::error::Result;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope is already parented; call remove_parent before reparenting")]
    AlreadyParented,
}

/// Well-known helper keys. Lookup checks the local map first and then
/// delegates to the parent chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperKey {
    ConditionEvaluator,
    Loader,
}

/// A helper object registered under a [`HelperKey`].
#[derive(Clone)]
pub enum Helper {
    ConditionEvaluator(Rc<dyn ConditionEvaluator>),
    Loader(Rc<dyn ScopeLoader>),
}

/// Deferred-resolution hook for scope contents. The core performs no I/O
/// itself; a loader may complete immediately or return a pending computation.
///
/// Loaders must do their work when the returned evaluation is settled, not
/// when `load` is called: a deferred evaluation may be dropped unpolled and
/// re-issued.
pub trait ScopeLoader {
    fn load(&self, scope: &Scope) -> Evaluation<'static, Result<()>>;
}

struct ScopeState {
    options: Value,
    parent: Weak<RefCell<ScopeState>>,
    helpers: HashMap<HelperKey, Helper>,
}

/// A configuration context node. Cloning is shallow: clones share state.
#[derive(Clone)]
pub struct Scope {
    state: Rc<RefCell<ScopeState>>,
}

impl Scope {
    pub fn new(options: Value) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScopeState {
                options,
                parent: Weak::new(),
                helpers: HashMap::new(),
            })),
        }
    }

    pub fn with_parent(options: Value, parent: &Scope) -> Self {
        let scope = Self::new(options);
        scope.state.borrow_mut().parent = Rc::downgrade(&parent.state);
        scope
    }

    /// The resolved options record. Children get a copy, never a mutable view.
    pub fn options(&self) -> Value {
        self.state.borrow().options.clone()
    }

    pub fn set_options(&self, options: Value) {
        self.state.borrow_mut().options = options;
    }

    pub fn parent(&self) -> Option<Scope> {
        self.state
            .borrow()
            .parent
            .upgrade()
            .map(|state| Scope { state })
    }

    pub fn has_parent(&self) -> bool {
        self.state.borrow().parent.upgrade().is_some()
    }

    /// Replaces the parent link. Reparenting onto the current parent is a
    /// no-op; moving to a different parent requires an explicit
    /// `remove_parent` first and fails otherwise.
    pub fn reparent(&self, new_parent: &Scope) -> std::result::Result<(), ScopeError> {
        let current = self.state.borrow().parent.upgrade();
        if let Some(current) = current {
            if Rc::ptr_eq(&current, &new_parent.state) {
                return Ok(());
            }
            return Err(ScopeError::AlreadyParented);
        }
        self.state.borrow_mut().parent = Rc::downgrade(&new_parent.state);
        Ok(())
    }

    /// Clears the parent link; a no-op at the root.
    pub fn remove_parent(&self) {
        self.state.borrow_mut().parent = Weak::new();
    }

    pub fn set_helper(&self, key: HelperKey, helper: Helper) {
        self.state.borrow_mut().helpers.insert(key, helper);
    }

    /// Helper lookup with upward delegation; `None` at the root when absent
    /// everywhere.
    pub fn helper(&self, key: HelperKey) -> Option<Helper> {
        if let Some(helper) = self.state.borrow().helpers.get(&key) {
            return Some(helper.clone());
        }
        self.parent().and_then(|parent| parent.helper(key))
    }

    /// Completes any deferred work needed before the scope's options and
    /// helpers are safe to read. Immediate when no loader is reachable.
    pub fn resolve(&self) -> Evaluation<'static, Result<()>> {
        match self.helper(HelperKey::Loader) {
            Some(Helper::Loader(loader)) => loader.load(self),
            _ => Evaluation::Ready(Ok(())),
        }
    }

    /// Identity comparison: true when both handles share one scope node.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scope")
            .field("options", &state.options)
            .field("has_parent", &state.parent.upgrade().is_some())
            .field("helpers", &state.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}
