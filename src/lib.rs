//! The Crucible House - Membership webhook service
//!
//! Receives Stripe webhook deliveries, verifies them, and keeps each
//! artist's paid membership state (stored in the identity provider's user
//! metadata) in line with their Stripe subscription.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
