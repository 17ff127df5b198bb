//! In-memory identity provider for testing and local development.
//!
//! Holds users and their metadata bags in a `RwLock<HashMap>`. Failures can
//! be injected per user to exercise error isolation.
//!
//! # Example
//!
//! ```ignore
//! let identity = InMemoryIdentityProvider::new()
//!     .with_user("u1", json!({ "display_name": "Ada" }));
//!
//! // ... run a webhook through the handler ...
//!
//! let record = identity.membership("u1").unwrap();
//! assert!(record.has_access());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::membership::{MembershipRecord, UserMetadata};
use crate::ports::{IdentityError, IdentityProvider, IdentityUser};

#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<String, UserMetadata>>,
    failing_users: RwLock<HashSet<String>>,
    update_count: RwLock<usize>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user whose metadata is the given JSON (non-objects become an
    /// empty bag).
    pub fn with_user(self, user_id: impl Into<String>, metadata: serde_json::Value) -> Self {
        self.users
            .write()
            .unwrap()
            .insert(user_id.into(), UserMetadata::from_value(metadata));
        self
    }

    /// Every call touching this user fails with `ServiceUnavailable`.
    pub fn with_failing_user(self, user_id: impl Into<String>) -> Self {
        self.failing_users.write().unwrap().insert(user_id.into());
        self
    }

    /// Current metadata bag for a user.
    pub fn metadata(&self, user_id: &str) -> Option<UserMetadata> {
        self.users.read().unwrap().get(user_id).cloned()
    }

    /// Membership view of a user's bag.
    pub fn membership(&self, user_id: &str) -> Option<MembershipRecord> {
        self.metadata(user_id)
            .map(|bag| MembershipRecord::from_metadata(&bag))
    }

    /// Number of successful metadata writes across all users.
    pub fn update_count(&self) -> usize {
        *self.update_count.read().unwrap()
    }

    fn check_failure(&self, user_id: &UserId) -> Result<(), IdentityError> {
        if self.failing_users.read().unwrap().contains(user_id.as_str()) {
            return Err(IdentityError::ServiceUnavailable(format!(
                "injected failure for {}",
                user_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user(&self, user_id: &UserId) -> Result<IdentityUser, IdentityError> {
        self.check_failure(user_id)?;

        let users = self.users.read().unwrap();
        let metadata = users
            .get(user_id.as_str())
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))?;

        Ok(IdentityUser {
            id: user_id.clone(),
            email: None,
            metadata,
        })
    }

    async fn update_user_metadata(
        &self,
        user_id: &UserId,
        metadata: UserMetadata,
    ) -> Result<(), IdentityError> {
        self.check_failure(user_id)?;

        let mut users = self.users.write().unwrap();
        let slot = users
            .get_mut(user_id.as_str())
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))?;
        *slot = metadata;
        *self.update_count.write().unwrap() += 1;
        Ok(())
    }
}
