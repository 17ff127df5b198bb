//! The identity provider's per-user metadata bag.
//!
//! Membership keys are only a handful of entries in this map; everything
//! else belongs to other parts of the application and must survive every
//! write untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped key/value bag attached to an identity provider user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMetadata(Map<String, Value>);

impl UserMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value. Anything other than an object (including `null`,
    /// which providers return for users that never had metadata) yields an
    /// empty bag.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every top-level key in `patch` overwrites the same key
    /// here, all other keys are kept. Nested objects are replaced, not merged.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    /// Consuming form of [`merge`](Self::merge).
    pub fn merged(mut self, patch: Map<String, Value>) -> Self {
        self.merge(patch);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for UserMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
