//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - Stripe lookups (subscriptions, customers)
//! - `IdentityProvider` - User metadata reads and writes

mod identity_provider;
mod payment_provider;

pub use identity_provider::{IdentityError, IdentityProvider, IdentityUser};
pub use payment_provider::{Customer, PaymentError, PaymentProvider, Subscription};
