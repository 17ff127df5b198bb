//! Identity provider adapters.
//!
//! - `SupabaseAdminClient` - Supabase Auth admin API (production)
//! - `InMemoryIdentityProvider` - in-process store for tests and local runs

mod in_memory;
mod supabase_admin;

pub use in_memory::InMemoryIdentityProvider;
pub use supabase_admin::{SupabaseAdminClient, SupabaseAdminConfig};
