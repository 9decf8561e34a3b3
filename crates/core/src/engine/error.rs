//! Error types for container construction and mutation.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container '{container}' already holds a child named '{ref_name}'")]
    DuplicateName { container: String, ref_name: String },

    #[error("no scope available to construct '{ref_name}'")]
    MissingScope { ref_name: String },

    #[error("'{op}' is not supported on this container; use '{use_instead}'")]
    UnsupportedOperation {
        op: &'static str,
        use_instead: &'static str,
    },
}
