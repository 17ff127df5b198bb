//! Errors raised when a primitive value is rejected.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Blank or whitespace-only input.
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("{field} is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}
