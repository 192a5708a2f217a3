//! Error types for handle operations
//!
//! Every failure is reported synchronously; nothing is coerced into a
//! default value.

use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty handle: '{operation}' needs at least one element")]
    EmptyHandle { operation: &'static str },

    #[error("Child not found: index {index} of {len} children")]
    ChildNotFound { index: isize, len: usize },

    #[error("Index out of range: {index} of {len} elements")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("Invalid event spec: {0}")]
    InvalidEventSpec(String),

    #[error("Unsupported argument for '{operation}': {reason}")]
    UnsupportedArgument {
        operation: &'static str,
        reason: String,
    },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

impl QueryError {
    pub(crate) fn unsupported(operation: &'static str, reason: impl Into<String>) -> Self {
        QueryError::UnsupportedArgument {
            operation,
            reason: reason.into(),
        }
    }
}
