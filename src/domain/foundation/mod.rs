//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types
//! that form the vocabulary of the Crucible House domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValueError;
pub use ids::UserId;
pub use timestamp::Timestamp;
