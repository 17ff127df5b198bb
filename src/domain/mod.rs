//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `membership` - Membership projection and Stripe webhook handling

pub mod foundation;
pub mod membership;
