//! Identifiers shared across the domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ValueError;

/// Identity provider user identifier.
///
/// Opaque to this service: whatever the identity provider hands out,
/// as long as it is not empty. Webhooks carry it as `metadata.userId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ValueError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValueError::Blank("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_opaque_strings() {
        let id = UserId::new("3f1c9a8e-user").unwrap();
        assert_eq!(id.as_str(), "3f1c9a8e-user");
        assert_eq!(id.to_string(), "3f1c9a8e-user");
    }

    #[test]
    fn user_id_rejects_empty() {
        assert!(matches!(
            UserId::new(""),
            Err(ValueError::Blank(_))
        ));
    }

    #[test]
    fn user_id_rejects_whitespace() {
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn user_id_parses_from_str() {
        let id: UserId = "u1".parse().unwrap();
        assert_eq!(id, UserId::new("u1").unwrap());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("u1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");

        let back: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn user_id_deserialize_rejects_empty() {
        let result: Result<UserId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
