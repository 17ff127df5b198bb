//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum router for the webhook endpoint
//! - `stripe` - Stripe REST API (`PaymentProvider`)
//! - `identity` - Supabase Auth admin API (`IdentityProvider`)

pub mod http;
pub mod identity;
pub mod stripe;

pub use identity::{InMemoryIdentityProvider, SupabaseAdminClient, SupabaseAdminConfig};
pub use stripe::{MockPaymentProvider, StripeConfig, StripePaymentAdapter};
