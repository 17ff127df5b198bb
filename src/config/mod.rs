//! Process configuration.
//!
//! Read once at startup from `CRUCIBLE_HOUSE__<SECTION>__<KEY>` environment
//! variables, with a `.env` file loaded first when present:
//!
//! - `CRUCIBLE_HOUSE__SERVER__PORT=8080` sets `server.port`
//! - `CRUCIBLE_HOUSE__PAYMENT__STRIPE_WEBHOOK_SECRET=whsec_...` sets
//!   `payment.stripe_webhook_secret`
//!
//! Every setting has a default so the service always starts. Unset secrets
//! are reported by [`AppConfig::missing_for_webhooks`]; deliveries are then
//! acknowledged without processing.

mod error;
mod identity;
mod payment;
mod server;

pub use error::{ConfigError, ValidationError};
pub use identity::IdentityConfig;
pub use payment::{PaymentConfig, StripeMode};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub payment: PaymentConfig,
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CRUCIBLE_HOUSE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Format checks for every section. Does not require secrets to be set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.identity.validate(self.server.environment)?;
        Ok(())
    }

    /// Settings that must be set before webhooks can be processed.
    pub fn missing_for_webhooks(&self) -> Vec<&'static str> {
        let mut missing = self.payment.missing();
        missing.extend(self.identity.missing());
        missing
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CRUCIBLE_HOUSE__PAYMENT__STRIPE_SECRET_KEY",
        "CRUCIBLE_HOUSE__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "CRUCIBLE_HOUSE__PAYMENT__REQUIRE_LIVEMODE",
        "CRUCIBLE_HOUSE__PAYMENT__STRIPE_TIMEOUT_SECS",
        "CRUCIBLE_HOUSE__IDENTITY__SUPABASE_TIMEOUT_SECS",
        "CRUCIBLE_HOUSE__IDENTITY__SUPABASE_URL",
        "CRUCIBLE_HOUSE__IDENTITY__SUPABASE_SERVICE_ROLE_KEY",
        "CRUCIBLE_HOUSE__SERVER__PORT",
        "CRUCIBLE_HOUSE__SERVER__ENVIRONMENT",
    ];

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_full_env() {
        env::set_var("CRUCIBLE_HOUSE__PAYMENT__STRIPE_SECRET_KEY", "sk_test_xxx");
        env::set_var("CRUCIBLE_HOUSE__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
        env::set_var("CRUCIBLE_HOUSE__IDENTITY__SUPABASE_URL", "https://xyz.supabase.co");
        env::set_var("CRUCIBLE_HOUSE__IDENTITY__SUPABASE_SERVICE_ROLE_KEY", "service-role");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_full_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.payment.stripe_webhook_secret, "whsec_xxx");
        assert_eq!(config.identity.supabase_url, "https://xyz.supabase.co");
        assert!(config.missing_for_webhooks().is_empty());
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_full_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn test_loads_without_any_secrets() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.missing_for_webhooks(),
            vec![
                "stripe secret key",
                "stripe webhook secret",
                "supabase url",
                "supabase service role key"
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_full_env();
        env::set_var("CRUCIBLE_HOUSE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_custom_server_port_and_livemode() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_full_env();
        env::set_var("CRUCIBLE_HOUSE__SERVER__PORT", "3000");
        env::set_var("CRUCIBLE_HOUSE__PAYMENT__REQUIRE_LIVEMODE", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.payment.require_livemode);
    }

    #[test]
    fn test_outbound_timeouts_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_full_env();
        env::set_var("CRUCIBLE_HOUSE__PAYMENT__STRIPE_TIMEOUT_SECS", "5");
        env::set_var("CRUCIBLE_HOUSE__IDENTITY__SUPABASE_TIMEOUT_SECS", "20");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payment.stripe_timeout(), std::time::Duration::from_secs(5));
        assert_eq!(config.identity.supabase_timeout(), std::time::Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }
}
