//! Runtime containers and evaluation.
//!
//! Containers are the executable counterparts of references: each owns a
//! scope and a name-keyed, insertion-ordered collection of child runtime
//! objects. Mutation keeps container state and scope parentage consistent in
//! one atomic step.

pub mod condition;
pub mod evaluation;

mod application;
mod error;
mod registry;
mod rule;
mod rule_set;

pub use application::Application;
pub use error::ContainerError;
pub use registry::ElementRegistry;
pub use rule::Rule;
pub use rule_set::RuleSet;
