//! Error types for reference parsing.

use thiserror::Error;

/// Errors raised while parsing hint-tagged source text. Each variant carries
/// the offending substring so callers can locate the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated hint marker near '{near}'")]
    UnterminatedHint { near: String },

    #[error("malformed hint marker near '{near}'")]
    MalformedHint { near: String },

    #[error("invalid options near '{near}': {message}")]
    InvalidOptions { near: String, message: String },

    #[error("hint '{tag}' is not allowed here, near '{near}'")]
    UnexpectedHint { tag: String, near: String },

    #[error("unexpected content no parser claims, near '{near}'")]
    UnexpectedContent { near: String },

    #[error("expected a reference near '{near}'")]
    MissingReference { near: String },

    #[error("parser internal error: {message}")]
    Internal { message: String },
}
