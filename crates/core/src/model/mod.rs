//! Reference trees and evaluation results.

mod references;
mod results;

pub use references::{ApplicationReference, RuleReference, RuleSetReference};
pub use results::{ApplicationResult, RuleResult, RuleSetResult};

/// Reference name used when a hint omits the `name` attribute.
pub const DEFAULT_NAME: &str = "Default";
