/// Address entities
///
/// Canonical addresses live in the backend's `addresses` table and are
/// deduplicated by the `get_or_create_address` stored procedure; this layer
/// only ever sees their ids. `profile_addresses` links users to addresses
/// with temporal versioning: a row is current while `valid_to` is null, and
/// at most one current primary row exists per (user, kind), enforced by
/// `ProfileService` sequencing rather than a database constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::{Entity, EntityId};

/// Address role for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Billing address
    Billing,

    /// Correspondence address
    Correspondence,
}

impl AddressKind {
    /// Converts kind to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Billing => "billing",
            AddressKind::Correspondence => "correspondence",
        }
    }
}

/// Input for resolving or creating a canonical address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressInput {
    /// First address line
    #[validate(length(min = 1, message = "Address line 1 must not be empty"))]
    pub line1: String,

    /// Second address line
    pub line2: Option<String>,

    /// City or town
    #[validate(length(min = 1, message = "City must not be empty"))]
    pub city: String,

    /// Region, county, or state
    pub region: Option<String>,

    /// Postal code
    #[validate(length(min = 1, message = "Postal code must not be empty"))]
    pub postal_code: String,

    /// ISO 3166-1 alpha-2 country code
    #[validate(length(equal = 2, message = "Country must be a two-letter code"))]
    pub country: String,
}

/// A user's link to a canonical address, with temporal validity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileAddress {
    /// Primary key
    #[serde(rename = "profile_address_id")]
    pub id: EntityId,

    /// Owning user
    pub user_id: EntityId,

    /// Canonical address id (from `get_or_create_address`)
    pub address_id: EntityId,

    /// Address role
    pub kind: AddressKind,

    /// Whether this is the user's primary address of its kind
    pub is_primary: bool,

    /// Start of validity
    pub valid_from: DateTime<Utc>,

    /// End of validity; null while current
    pub valid_to: Option<DateTime<Utc>>,
}

impl ProfileAddress {
    /// Creates a current primary link starting at `valid_from`
    pub fn new_primary(
        user_id: EntityId,
        address_id: EntityId,
        kind: AddressKind,
        valid_from: DateTime<Utc>,
    ) -> Self {
        ProfileAddress {
            id: EntityId::generate(),
            user_id,
            address_id,
            kind,
            is_primary: true,
            valid_from,
            valid_to: None,
        }
    }

    /// Whether the link is currently valid
    pub fn is_current(&self) -> bool {
        self.valid_to.is_none()
    }
}

impl Entity for ProfileAddress {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            line1: "1 High Street".to_string(),
            line2: None,
            city: "Leeds".to_string(),
            region: None,
            postal_code: "LS1 1AA".to_string(),
            country: "GB".to_string(),
        }
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(AddressKind::Billing.as_str(), "billing");
        assert_eq!(AddressKind::Correspondence.as_str(), "correspondence");
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_invalid_input_fails() {
        let mut bad = input();
        bad.line1 = String::new();
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.country = "GBR".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_new_primary_is_current() {
        let link = ProfileAddress::new_primary(
            EntityId::new("u-1").unwrap(),
            EntityId::new("a-1").unwrap(),
            AddressKind::Billing,
            Utc::now(),
        );
        assert!(link.is_primary);
        assert!(link.is_current());
    }
}
