/// Entity identity primitives
///
/// Domain objects have identity: two loaded copies of the same backend row
/// are the same entity even when their field values have diverged. Identity
/// lives in [`EntityId`], a validated wrapper over the backend's string
/// primary keys, and the [`Entity`] trait exposes it uniformly.
///
/// # Example
///
/// ```
/// use folio_domain::entity::EntityId;
///
/// let id = EntityId::new("portfolio-1").unwrap();
/// assert_eq!(id.as_str(), "portfolio-1");
///
/// assert!(EntityId::new("   ").is_err());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ServiceError;

/// A validated entity identifier
///
/// Wraps the backend's string primary keys. Empty and whitespace-only
/// values are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an identifier, rejecting empty input
    pub fn new(value: impl Into<String>) -> Result<Self, ServiceError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Identifier must not be empty".to_string(),
            ));
        }
        Ok(EntityId(value))
    }

    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        EntityId(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&EntityId> for serde_json::Value {
    fn from(id: &EntityId) -> Self {
        serde_json::Value::String(id.0.clone())
    }
}

/// Common contract for domain entities
///
/// Entities compare by identity, not by value: `same_identity` is true for
/// two copies of the same row regardless of field state.
pub trait Entity {
    /// The entity's primary key
    fn id(&self) -> &EntityId;

    /// Identity comparison, by id only
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
