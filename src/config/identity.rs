//! `identity.*` settings: Supabase admin access.

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;
use super::payment::{is_http_url, DEFAULT_OUTBOUND_TIMEOUT_SECS, MAX_OUTBOUND_TIMEOUT_SECS};
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,

    /// Service-role key. Grants full admin access; server side only.
    pub supabase_service_role_key: String,

    pub supabase_timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            supabase_timeout_secs: DEFAULT_OUTBOUND_TIMEOUT_SECS,
        }
    }
}

impl IdentityConfig {
    pub fn supabase_timeout(&self) -> Duration {
        Duration::from_secs(self.supabase_timeout_secs)
    }

    /// Names of unset settings webhook processing needs.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.supabase_url.is_empty(), "supabase url"),
            (
                self.supabase_service_role_key.is_empty(),
                "supabase service role key",
            ),
        ]
        .into_iter()
        .filter_map(|(absent, name)| absent.then_some(name))
        .collect()
    }

    /// Plain http is tolerated outside production for a local Supabase stack.
    pub fn validate(&self, env: Environment) -> Result<(), ValidationError> {
        if !(1..=MAX_OUTBOUND_TIMEOUT_SECS).contains(&self.supabase_timeout_secs) {
            return Err(ValidationError::InvalidSupabaseTimeout);
        }

        let url = self.supabase_url.as_str();
        if url.is_empty() {
            return Ok(());
        }
        if !is_http_url(url) {
            return Err(ValidationError::InvalidSupabaseUrl);
        }
        if env == Environment::Production && !url.starts_with("https://") {
            return Err(ValidationError::SupabaseUrlMustBeHttps);
        }
        Ok(())
    }
}
