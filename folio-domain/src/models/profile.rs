/// User profile entity
///
/// Profiles extend the auth provider's user record with billing and usage
/// state. The row is normally created by a backend trigger on sign-up;
/// `AuthService::load_user_profile` self-heals with an idempotent insert
/// when the trigger lags.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};

/// Subscription plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Standard,
    Premium,
}

impl SubscriptionPlan {
    /// Converts plan to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Standard => "standard",
            SubscriptionPlan::Premium => "premium",
        }
    }

    /// Task-creation allowance for the plan
    pub fn default_tasks_limit(&self) -> i64 {
        match self {
            SubscriptionPlan::Free => 50,
            SubscriptionPlan::Standard => 500,
            SubscriptionPlan::Premium => 5_000,
        }
    }
}

/// User profile entity (read-mostly)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Auth provider user id (primary key)
    pub user_id: EntityId,

    /// Email address
    pub email: String,

    /// Full name, filled in by profile completion
    pub full_name: Option<String>,

    /// Date of birth, filled in by profile completion
    pub date_of_birth: Option<NaiveDate>,

    /// Lifetime count of tasks created
    pub tasks_created: i64,

    /// Current subscription plan
    pub subscription_plan: SubscriptionPlan,

    /// Task-creation allowance
    pub tasks_limit: i64,

    /// Billing-provider customer id, once billing is set up
    pub stripe_customer_id: Option<String>,
}

impl Profile {
    /// Creates a fresh default profile for a user
    pub fn new(user_id: EntityId, email: impl Into<String>) -> Self {
        let plan = SubscriptionPlan::default();
        Profile {
            user_id,
            email: email.into(),
            full_name: None,
            date_of_birth: None,
            tasks_created: 0,
            subscription_plan: plan,
            tasks_limit: plan.default_tasks_limit(),
            stripe_customer_id: None,
        }
    }

    /// Whether the user has exhausted the plan's task allowance
    pub fn at_task_limit(&self) -> bool {
        self.tasks_created >= self.tasks_limit
    }
}

impl Entity for Profile {
    fn id(&self) -> &EntityId {
        &self.user_id
    }
}
