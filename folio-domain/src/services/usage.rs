/// Usage tracking and plan limits
///
/// Task creation counts against the user's plan allowance
/// (`profiles.tasks_created` vs `profiles.tasks_limit`). The tracker is
/// consulted before creation and asked to record afterwards; recording is
/// best-effort, so the caller logs and continues when it fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use folio_backend::client::BackendClient;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::Profile;
use crate::repository::{Filter, QueryOptions};

/// Usage-tracking contract consulted by `TaskService`
#[async_trait]
pub trait UsageTracker: Send + Sync {
    /// Refuses with a quota error when the user is at their limit
    async fn check(&self, user_id: &EntityId) -> Result<(), ServiceError>;

    /// Records one task creation
    async fn record(&self, user_id: &EntityId) -> Result<(), ServiceError>;
}

/// One appended usage event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Primary key
    #[serde(rename = "usage_id")]
    pub id: EntityId,

    /// User the event belongs to
    pub user_id: EntityId,

    /// Event name
    pub event: String,

    /// When the event happened
    pub created_at: DateTime<Utc>,
}

/// Backend-backed tracker over `profiles` and `usage_tracking`
pub struct BackendUsageTracker {
    client: Arc<BackendClient>,
}

impl BackendUsageTracker {
    /// Creates the tracker over the shared client
    pub fn new(client: Arc<BackendClient>) -> Self {
        BackendUsageTracker { client }
    }

    async fn load_profile(&self, user_id: &EntityId) -> Result<Option<Profile>, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .limit(1);
        let mut rows: Vec<Profile> = self.client.table("profiles").select(&options).await?;
        Ok(rows.pop())
    }
}

#[async_trait]
impl UsageTracker for BackendUsageTracker {
    async fn check(&self, user_id: &EntityId) -> Result<(), ServiceError> {
        match self.load_profile(user_id).await? {
            Some(profile) if profile.at_task_limit() => Err(ServiceError::QuotaExceeded {
                used: profile.tasks_created,
                limit: profile.tasks_limit,
            }),
            Some(_) => Ok(()),
            None => {
                // No profile row yet (trigger lag); do not block creation.
                tracing::debug!(user_id = %user_id, "no profile row, skipping quota check");
                Ok(())
            }
        }
    }

    async fn record(&self, user_id: &EntityId) -> Result<(), ServiceError> {
        if let Some(profile) = self.load_profile(user_id).await? {
            self.client
                .table("profiles")
                .update(
                    &json!({ "tasks_created": profile.tasks_created + 1 }),
                    &[Filter::eq("user_id", user_id.as_str())],
                )
                .await?;
        }

        let event = UsageEvent {
            id: EntityId::generate(),
            user_id: user_id.clone(),
            event: "task_created".to_string(),
            created_at: Utc::now(),
        };
        self.client
            .table("usage_tracking")
            .upsert(&event, "usage_id")
            .await?;

        Ok(())
    }
}

/// In-memory tracker for tests and demos
///
/// Unlimited by default; give it a limit to exercise quota refusal.
#[derive(Default)]
pub struct MemoryUsageTracker {
    limit: Option<i64>,
    counts: Mutex<HashMap<String, i64>>,
}

impl MemoryUsageTracker {
    /// Creates a tracker that never refuses
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Creates a tracker refusing after `limit` recorded creations
    pub fn with_limit(limit: i64) -> Self {
        MemoryUsageTracker {
            limit: Some(limit),
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Recorded creations for a user
    pub fn count(&self, user_id: &EntityId) -> i64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id.as_str())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl UsageTracker for MemoryUsageTracker {
    async fn check(&self, user_id: &EntityId) -> Result<(), ServiceError> {
        if let Some(limit) = self.limit {
            let used = self.count(user_id);
            if used >= limit {
                return Err(ServiceError::QuotaExceeded { used, limit });
            }
        }
        Ok(())
    }

    async fn record(&self, user_id: &EntityId) -> Result<(), ServiceError> {
        *self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.as_str().to_string())
            .or_insert(0) += 1;
        Ok(())
    }
}
