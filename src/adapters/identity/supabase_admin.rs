//! Supabase Auth (GoTrue) admin adapter.
//!
//! Implements the `IdentityProvider` port with the admin user endpoints:
//!
//! - `GET  {url}/auth/v1/admin/users/{id}` - read the user and `user_metadata`
//! - `PUT  {url}/auth/v1/admin/users/{id}` - write `user_metadata`
//!
//! Both calls authenticate with the service-role key, sent as the `apikey`
//! header and as a bearer token. The key bypasses row level security and
//! must never leave the server.
//!
//! # Example
//!
//! ```ignore
//! let config = SupabaseAdminConfig::new("https://xyz.supabase.co", service_role_key);
//! let identity = SupabaseAdminClient::new(config)?;
//! let user = identity.get_user(&user_id).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::membership::UserMetadata;
use crate::ports::{IdentityError, IdentityProvider, IdentityUser};

/// Configuration for the Supabase admin adapter.
#[derive(Clone)]
pub struct SupabaseAdminConfig {
    /// Project URL (e.g., "https://xyz.supabase.co").
    pub project_url: String,

    /// Service-role key.
    pub service_role_key: SecretString,

    /// Per-request timeout. Defaults to 10 seconds.
    pub timeout: Duration,
}

impl SupabaseAdminConfig {
    pub fn new(project_url: impl Into<String>, service_role_key: SecretString) -> Self {
        Self {
            project_url: project_url.into(),
            service_role_key,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

}

/// The slice of GoTrue's user object we read.
#[derive(Debug, Deserialize)]
struct AdminUserResponse {
    id: String,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    user_metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct UpdateMetadataRequest<'a> {
    user_metadata: &'a UserMetadata,
}

/// Identity provider backed by the Supabase Auth admin API.
pub struct SupabaseAdminClient {
    config: SupabaseAdminConfig,
    base_url: reqwest::Url,
    http_client: reqwest::Client,
}

impl SupabaseAdminClient {
    pub fn new(config: SupabaseAdminConfig) -> Result<Self, IdentityError> {
        let base_url = reqwest::Url::parse(&config.project_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                IdentityError::Misconfigured(format!(
                    "invalid project url: {}",
                    config.project_url
                ))
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                IdentityError::ServiceUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// `{project}/auth/v1/admin/users/{id}` with the id as a single
    /// percent-encoded path segment.
    fn user_url(&self, user_id: &UserId) -> Result<reqwest::Url, IdentityError> {
        // `.` and `..` would be dropped as segments and address the user list.
        if matches!(user_id.as_str(), "." | "..") {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                IdentityError::Misconfigured(format!("invalid project url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["auth", "v1", "admin", "users", user_id.as_str()]);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.service_role_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }
}

async fn check_status(
    response: reqwest::Response,
    user_id: &UserId,
) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        reqwest::StatusCode::NOT_FOUND => IdentityError::UserNotFound(user_id.to_string()),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            IdentityError::Unauthorized(body)
        }
        s if s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS => {
            IdentityError::ServiceUnavailable(format!("HTTP {}: {}", s.as_u16(), body))
        }
        s => IdentityError::InvalidResponse(format!("HTTP {}: {}", s.as_u16(), body)),
    })
}

#[async_trait]
impl IdentityProvider for SupabaseAdminClient {
    async fn get_user(&self, user_id: &UserId) -> Result<IdentityUser, IdentityError> {
        let url = self.user_url(user_id)?;
        tracing::debug!(user_id = %user_id, "Fetching user from Supabase admin API");

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|e| IdentityError::ServiceUnavailable(e.to_string()))?;

        let user: AdminUserResponse = check_status(response, user_id)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        let id = UserId::new(user.id).map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(IdentityUser {
            id,
            email: user.email,
            metadata: UserMetadata::from_value(user.user_metadata),
        })
    }

    async fn update_user_metadata(
        &self,
        user_id: &UserId,
        metadata: UserMetadata,
    ) -> Result<(), IdentityError> {
        let url = self.user_url(user_id)?;
        tracing::debug!(user_id = %user_id, keys = metadata.len(), "Writing user metadata");

        let response = self
            .authorized(self.http_client.put(url))
            .json(&UpdateMetadataRequest {
                user_metadata: &metadata,
            })
            .send()
            .await
            .map_err(|e| IdentityError::ServiceUnavailable(e.to_string()))?;

        check_status(response, user_id).await?;
        Ok(())
    }
}
