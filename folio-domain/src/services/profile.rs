/// Profile service
///
/// Profile completion and the temporal primary-billing-address sequence.
///
/// # Temporal addresses
///
/// `profile_addresses` rows version a user's addresses over time: a row is
/// current while `valid_to` is null. Upserting a new primary closes the old
/// row by setting its `valid_to` to one second before the new row's
/// `valid_from`; the gap avoids tripping the backend's temporal-overlap
/// constraint. The two steps are sequential awaited calls, not one
/// transaction; a crash between them can transiently leave zero current
/// rows, which the next upsert repairs.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use folio_backend::client::BackendClient;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::{AddressInput, AddressKind, Profile, ProfileAddress};
use crate::repository::{Filter, QueryOptions};

/// Stored procedure resolving a canonical, deduplicated address
const GET_OR_CREATE_ADDRESS: &str = "get_or_create_address";

/// Breakdown of what a profile still needs to be complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileCompletion {
    /// Non-empty full name present
    pub has_full_name: bool,

    /// Date of birth present and not in the future
    pub has_valid_date_of_birth: bool,

    /// A currently-valid primary billing address exists
    pub has_billing_address: bool,
}

impl ProfileCompletion {
    /// Whether the profile is complete
    pub fn is_complete(&self) -> bool {
        self.has_full_name && self.has_valid_date_of_birth && self.has_billing_address
    }
}

/// Profile orchestration service
pub struct ProfileService {
    client: Arc<BackendClient>,
}

impl ProfileService {
    /// Creates the service over the shared client
    pub fn new(client: Arc<BackendClient>) -> Self {
        ProfileService { client }
    }

    /// Computes the user's completion status
    pub async fn completion_status(
        &self,
        user_id: &EntityId,
    ) -> Result<ProfileCompletion, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .limit(1);
        let mut profiles: Vec<Profile> = self.client.table("profiles").select(&options).await?;
        let profile = profiles.pop();

        let billing = self.current_primary(user_id, AddressKind::Billing).await?;

        Ok(evaluate_completion(
            profile.as_ref(),
            !billing.is_empty(),
            Utc::now().date_naive(),
        ))
    }

    /// Installs a new primary billing address for the user
    ///
    /// Resolves the canonical address via the dedup stored procedure,
    /// closes out any previous current primary billing row, then inserts
    /// the new current row. At most one current primary per (user, kind)
    /// holds at any instant, by this sequencing.
    pub async fn upsert_primary_billing_address(
        &self,
        user_id: &EntityId,
        input: AddressInput,
    ) -> Result<ProfileAddress, ServiceError> {
        input.validate()?;

        let address_id: String = self
            .client
            .rpc(
                GET_OR_CREATE_ADDRESS,
                &json!({
                    "p_line1": input.line1,
                    "p_line2": input.line2,
                    "p_city": input.city,
                    "p_region": input.region,
                    "p_postal_code": input.postal_code,
                    "p_country": input.country,
                }),
            )
            .await?;

        let valid_from = Utc::now();
        let closed_at = close_out_timestamp(valid_from);

        for previous in self.current_primary(user_id, AddressKind::Billing).await? {
            self.client
                .table("profile_addresses")
                .update(
                    &json!({ "valid_to": closed_at }),
                    &[Filter::eq("profile_address_id", previous.id.as_str())],
                )
                .await?;
            tracing::debug!(
                profile_address_id = %previous.id,
                "closed previous primary billing address"
            );
        }

        let record = ProfileAddress::new_primary(
            user_id.clone(),
            EntityId::new(address_id)?,
            AddressKind::Billing,
            valid_from,
        );
        self.client
            .table("profile_addresses")
            .upsert(&record, "profile_address_id")
            .await?;

        tracing::info!(user_id = %user_id, "primary billing address updated");
        Ok(record)
    }

    /// Loads the user's current primary rows of a kind
    async fn current_primary(
        &self,
        user_id: &EntityId,
        kind: AddressKind,
    ) -> Result<Vec<ProfileAddress>, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .filter(Filter::eq("kind", kind.as_str()))
            .filter(Filter::eq("is_primary", true))
            .filter(Filter::is_null("valid_to"));
        let rows = self.client.table("profile_addresses").select(&options).await?;
        Ok(rows)
    }
}

/// Close-out timestamp for the row being superseded
///
/// One second before the successor's `valid_from`, keeping the two validity
/// ranges strictly disjoint.
fn close_out_timestamp(valid_from: DateTime<Utc>) -> DateTime<Utc> {
    valid_from - Duration::seconds(1)
}

/// Evaluates completion from loaded state
fn evaluate_completion(
    profile: Option<&Profile>,
    has_billing_address: bool,
    today: NaiveDate,
) -> ProfileCompletion {
    let has_full_name = profile
        .and_then(|p| p.full_name.as_deref())
        .map(|name| !name.trim().is_empty())
        .unwrap_or(false);

    let has_valid_date_of_birth = profile
        .and_then(|p| p.date_of_birth)
        .map(|dob| dob <= today)
        .unwrap_or(false);

    ProfileCompletion {
        has_full_name,
        has_valid_date_of_birth,
        has_billing_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(full_name: Option<&str>, dob: Option<NaiveDate>) -> Profile {
        let mut profile = Profile::new(EntityId::new("u-1").unwrap(), "a@b.c");
        profile.full_name = full_name.map(String::from);
        profile.date_of_birth = dob;
        profile
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_complete_profile() {
        let p = profile(Some("Jo Bloggs"), NaiveDate::from_ymd_opt(1990, 1, 1));
        let status = evaluate_completion(Some(&p), true, today());
        assert!(status.is_complete());
    }

    #[test]
    fn test_blank_name_is_incomplete() {
        let p = profile(Some("   "), NaiveDate::from_ymd_opt(1990, 1, 1));
        let status = evaluate_completion(Some(&p), true, today());
        assert!(!status.has_full_name);
        assert!(!status.is_complete());
    }

    #[test]
    fn test_future_date_of_birth_is_invalid() {
        let p = profile(Some("Jo"), NaiveDate::from_ymd_opt(2030, 1, 1));
        let status = evaluate_completion(Some(&p), true, today());
        assert!(!status.has_valid_date_of_birth);
    }

    #[test]
    fn test_date_of_birth_today_is_valid() {
        let p = profile(Some("Jo"), Some(today()));
        let status = evaluate_completion(Some(&p), true, today());
        assert!(status.has_valid_date_of_birth);
    }

    #[test]
    fn test_missing_profile_is_incomplete() {
        let status = evaluate_completion(None, false, today());
        assert!(!status.has_full_name);
        assert!(!status.has_valid_date_of_birth);
        assert!(!status.has_billing_address);
        assert!(!status.is_complete());
    }

    #[test]
    fn test_missing_billing_address_is_incomplete() {
        let p = profile(Some("Jo"), NaiveDate::from_ymd_opt(1990, 1, 1));
        let status = evaluate_completion(Some(&p), false, today());
        assert!(!status.is_complete());
    }

    #[test]
    fn test_close_out_precedes_valid_from() {
        let valid_from = Utc::now();
        let closed = close_out_timestamp(valid_from);
        assert!(closed < valid_from);
        assert_eq!((valid_from - closed).num_seconds(), 1);
    }
}
