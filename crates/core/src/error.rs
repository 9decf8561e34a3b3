use thiserror::Error;

use crate::engine::condition::ConditionError;
use crate::engine::ContainerError;
use crate::parser::ParseError;
use crate::scope::ScopeError;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error("{0}")]
    Message(String),
}

impl CoreError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
