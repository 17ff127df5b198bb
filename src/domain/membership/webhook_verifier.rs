//! Stripe webhook signature verification.
//!
//! Stripe signs `"{t}.{raw body}"` with HMAC-SHA256 under the endpoint
//! secret and sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`.
//! A delivery is authentic when any `v1` entry matches. Other schemes
//! (`v0`, future versions) are skipped. The timestamp must fall inside the
//! replay window.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Oldest acceptable signature, in seconds.
const REPLAY_WINDOW_SECS: i64 = 300;

/// How far a signature may be ahead of the local clock, in seconds.
const FUTURE_SKEW_SECS: i64 = 60;

/// Decoded `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Several are sent while an endpoint secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',').map(str::trim) {
            let Some((scheme, value)) = part.split_once('=') else {
                return Err(malformed(format!("segment {:?} is not key=value", part)));
            };
            match scheme {
                "t" => {
                    let ts = value
                        .parse::<i64>()
                        .map_err(|_| malformed(format!("timestamp {:?}", value)))?;
                    timestamp = Some(ts);
                }
                "v1" => {
                    let sig = hex::decode(value)
                        .map_err(|_| malformed("v1 signature is not hex".to_string()))?;
                    v1_signatures.push(sig);
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| malformed("no timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(malformed("no v1 signature".to_string()));
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

fn malformed(detail: String) -> WebhookError {
    WebhookError::ParseError(format!("Stripe-Signature header: {}", detail))
}

/// Checks deliveries against one endpoint secret.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    require_livemode: bool,
}

impl StripeWebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            require_livemode: false,
        }
    }

    /// Treat `livemode: false` events as ignorable.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    /// Authenticates the raw `payload` and parses it into an event.
    ///
    /// # Errors
    ///
    /// - `ParseError` for a malformed header or a body that is not an event
    /// - `TimestampOutOfRange` for a signature older than the replay window
    /// - `InvalidTimestamp` for a signature too far in the future
    /// - `InvalidSignature` when no `v1` entry matches
    /// - `Ignored` for a test-mode event while livemode is required
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        check_freshness(header.timestamp, now)?;

        let expected = self.sign(header.timestamp, payload)?;
        let authentic = header.v1_signatures.iter().any(|candidate| {
            candidate.len() == expected.len()
                && bool::from(candidate.as_slice().ct_eq(expected.as_slice()))
        });
        if !authentic {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(format!("event body: {}", e)))?;

        if self.require_livemode && !event.is_live() {
            return Err(WebhookError::Ignored(format!("test mode event {}", event.id)));
        }
        Ok(event)
    }

    /// `Stripe-Signature` value Stripe would send for `payload` at
    /// `timestamp`. Lets callers exercise the endpoint end to end.
    pub fn signature_header_for(
        &self,
        timestamp: i64,
        payload: &[u8],
    ) -> Result<String, WebhookError> {
        let signature = self.sign(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn sign(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::NotConfigured("stripe webhook secret"))?;
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn check_freshness(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now.saturating_sub(timestamp);
    if age > REPLAY_WINDOW_SECS {
        Err(WebhookError::TimestampOutOfRange)
    } else if age < -FUTURE_SKEW_SECS {
        Err(WebhookError::InvalidTimestamp)
    } else {
        Ok(())
    }
}
