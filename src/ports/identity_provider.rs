//! Identity provider port for user metadata reads and writes.
//!
//! The membership projection lives in the identity provider's per-user
//! metadata bag. This port is the only way the webhook flow touches it.
//!
//! # Example
//!
//! ```ignore
//! let user = identity.get_user(&user_id).await?;
//! let merged = user.metadata.merged(patch.to_metadata());
//! identity.update_user_metadata(&user_id, merged).await?;
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::membership::{UserMetadata, WebhookError};

/// A user as seen by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityUser {
    pub id: UserId,
    pub email: Option<String>,
    pub metadata: UserMetadata,
}

/// Errors from identity provider operations.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Identity provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Identity provider unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),

    /// The adapter cannot build requests, e.g. an unusable project URL.
    #[error("Identity provider misconfigured: {0}")]
    Misconfigured(String),
}

impl From<IdentityError> for WebhookError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UserNotFound(id) => WebhookError::UserNotFound(id),
            other => WebhookError::IdentityProvider(other.to_string()),
        }
    }
}

/// Reads and replaces user metadata in the identity provider.
///
/// # Contract
///
/// Implementations must:
/// - Return `IdentityError::UserNotFound` if the user doesn't exist
/// - Return `IdentityError::ServiceUnavailable` for transient errors
/// - Treat `update_user_metadata` as a full replacement of the bag;
///   merging is the caller's job
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get a user and their current metadata.
    async fn get_user(&self, user_id: &UserId) -> Result<IdentityUser, IdentityError>;

    /// Replace the user's metadata bag.
    async fn update_user_metadata(
        &self,
        user_id: &UserId,
        metadata: UserMetadata,
    ) -> Result<(), IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn IdentityProvider) {}
    }

    #[test]
    fn user_not_found_displays_id() {
        let err = IdentityError::UserNotFound("u1".into());
        assert_eq!(err.to_string(), "User not found: u1");
    }

    #[test]
    fn not_found_maps_to_user_not_found() {
        let err: WebhookError = IdentityError::UserNotFound("u1".into()).into();
        assert!(matches!(err, WebhookError::UserNotFound(id) if id == "u1"));
    }

    #[test]
    fn other_failures_map_to_identity_provider_error() {
        let err: WebhookError = IdentityError::ServiceUnavailable("timeout".into()).into();
        assert!(matches!(err, WebhookError::IdentityProvider(_)));
        assert!(err.is_retryable());
    }
}
