//! Stripe REST lookups behind [`PaymentProvider`](crate::ports::PaymentProvider),
//! plus an in-memory double for tests and unconfigured local runs.
//!
//! Signature checks are not here; see `domain::membership::StripeWebhookVerifier`.

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::{MockPaymentProvider, StripeCall, StripeLookup};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
