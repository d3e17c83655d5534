/// Portfolio entity
///
/// A portfolio groups a user's tasks, typically one portfolio per property
/// or block. Deleting a portfolio does **not** cascade to its tasks at this
/// layer; callers must delete the tasks explicitly first.
///
/// # Schema
///
/// ```text
/// portfolios (
///     portfolio_id  text primary key,
///     user_id       text not null,
///     name          text not null,
///     description   text,
///     created_at    timestamptz not null,
///     updated_at    timestamptz not null
/// )
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::ServiceError;
use crate::repository::TableRecord;

/// Portfolio entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// Primary key
    #[serde(rename = "portfolio_id")]
    pub id: EntityId,

    /// Owning user
    pub user_id: EntityId,

    /// Display name (never empty)
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// When the portfolio was created
    pub created_at: DateTime<Utc>,

    /// When the portfolio was last updated
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    /// Creates a new portfolio with a generated id
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is empty.
    pub fn new(
        user_id: EntityId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, ServiceError> {
        let name = name.into();
        validate_name(&name)?;

        let now = Utc::now();
        Ok(Portfolio {
            id: EntityId::generate(),
            user_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        })
    }

    /// Renames the portfolio
    ///
    /// # Errors
    ///
    /// Returns a validation error when the new name is empty.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ServiceError> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Replaces the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Portfolio name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Entity for Portfolio {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl TableRecord for Portfolio {
    const TABLE: &'static str = "portfolios";

    fn primary_key(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio() -> Portfolio {
        Portfolio::new(
            EntityId::new("u-1").unwrap(),
            "Victoria Road",
            Some("Two flats".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_empty_name() {
        let result = Portfolio::new(EntityId::new("u-1").unwrap(), "  ", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_rename_rejects_empty_name() {
        let mut portfolio = portfolio();
        assert!(portfolio.rename("").is_err());
        assert_eq!(portfolio.name, "Victoria Road");

        portfolio.rename("Albert Square").unwrap();
        assert_eq!(portfolio.name, "Albert Square");
    }

    #[test]
    fn test_identity_is_by_id_only() {
        let a = portfolio();
        let mut b = a.clone();
        b.name = "Renamed".to_string();
        assert!(a.same_identity(&b));

        let c = portfolio();
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_primary_key_column_follows_convention() {
        assert_eq!(Portfolio::primary_key_column(), "portfolio_id");
    }

    #[test]
    fn test_serializes_to_column_names() {
        let value = serde_json::to_value(portfolio()).unwrap();
        assert!(value.get("portfolio_id").is_some());
        assert!(value.get("user_id").is_some());
        assert!(value.get("id").is_none());
    }
}
