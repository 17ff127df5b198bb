//! crucible-house server binary.
//!
//! Loads configuration from the environment (and `.env`), builds the Stripe
//! and Supabase clients, and serves the webhook endpoint until Ctrl-C or
//! SIGTERM.

use std::sync::Arc;

use anyhow::Context as _;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crucible_house::adapters::http::{app_router, WebhookAppState};
use crucible_house::adapters::identity::{SupabaseAdminClient, SupabaseAdminConfig};
use crucible_house::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use crucible_house::application::HandlePaymentWebhookHandler;
use crucible_house::config::{AppConfig, StripeMode};
use crucible_house::domain::membership::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    let state = build_state(&config)?;
    let addr = config.server.socket_addr()?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, environment = %config.server.environment, "Listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` overrides
/// the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn build_state(config: &AppConfig) -> anyhow::Result<WebhookAppState> {
    let timeout = config.server.request_timeout();

    let missing = config.missing_for_webhooks();
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Webhook processing disabled; deliveries will be acknowledged and dropped"
        );
        return Ok(WebhookAppState::unconfigured(missing).with_processing_timeout(timeout));
    }

    let payments = StripePaymentAdapter::new(
        StripeConfig::new(config.payment.stripe_secret_key.clone())
            .with_base_url(config.payment.stripe_api_base_url.clone())
            .with_timeout(config.payment.stripe_timeout()),
    )
    .context("failed to build Stripe client")?;

    let identity = SupabaseAdminClient::new(
        SupabaseAdminConfig::new(
            config.identity.supabase_url.clone(),
            SecretString::new(config.identity.supabase_service_role_key.clone()),
        )
        .with_timeout(config.identity.supabase_timeout()),
    )
    .context("failed to build Supabase admin client")?;

    if config.payment.mode() == StripeMode::Test {
        tracing::info!("Using Stripe test mode key");
    }

    let verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
        .with_require_livemode(config.payment.require_livemode);
    let handler =
        HandlePaymentWebhookHandler::standard(verifier, Arc::new(payments), Arc::new(identity));

    Ok(WebhookAppState::new(Arc::new(handler)).with_processing_timeout(timeout))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
