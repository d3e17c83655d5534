/// Task creation strategies
///
/// Creating a task can take more than one route: a serverless function that
/// enriches the task (AI labeling) or a plain direct insert. Strategies are
/// interchangeable implementations of one contract, tried in a fixed order
/// by `TaskService::create_task` until one succeeds. The remote route must
/// never block task creation when it is down; the direct route always
/// reports it can handle a draft and is the guaranteed fallback.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folio_domain::entity::EntityId;
/// use folio_domain::models::Task;
/// use folio_domain::repository::MemoryRepository;
/// use folio_domain::strategy::{DirectTaskCreation, TaskCreationStrategy, TaskDraft};
///
/// # async fn example() -> Result<(), folio_domain::error::ServiceError> {
/// let strategy = DirectTaskCreation::new(Arc::new(MemoryRepository::<Task>::new()));
/// let draft = TaskDraft::new(EntityId::new("u-1")?, "Fix boiler");
///
/// assert!(strategy.can_handle(&draft).await);
/// let created = strategy.create(&draft).await?;
/// println!("created via {}", created.source.as_str());
/// # Ok(())
/// # }
/// ```

pub mod direct;
pub mod function;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::Task;

pub use direct::DirectTaskCreation;
pub use function::FunctionTaskCreation;

/// Which route produced a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationSource {
    /// Created by the remote function (possibly enriched)
    Remote,

    /// Created by a direct insert
    Direct,
}

impl CreationSource {
    /// Source name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationSource::Remote => "remote",
            CreationSource::Direct => "direct",
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    /// Owning user
    pub user_id: EntityId,

    /// Task title
    #[validate(length(min = 1, message = "Task title must not be empty"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Containing portfolio, if any
    pub portfolio_id: Option<EntityId>,
}

impl TaskDraft {
    /// Creates a draft with only the required fields
    pub fn new(user_id: EntityId, title: impl Into<String>) -> Self {
        TaskDraft {
            user_id,
            title: title.into(),
            description: None,
            portfolio_id: None,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assigns the draft to a portfolio
    pub fn in_portfolio(mut self, portfolio_id: EntityId) -> Self {
        self.portfolio_id = Some(portfolio_id);
        self
    }
}

/// A task produced by a strategy, tagged with its route
#[derive(Debug, Clone)]
pub struct CreatedTask {
    /// The created task
    pub task: Task,

    /// Which route produced it
    pub source: CreationSource,
}

/// Contract for one task-creation route
#[async_trait]
pub trait TaskCreationStrategy: Send + Sync {
    /// Strategy name, for logging
    fn name(&self) -> &str;

    /// Whether this strategy can attempt the draft
    ///
    /// A false return skips the strategy without counting as a failure.
    async fn can_handle(&self, draft: &TaskDraft) -> bool;

    /// Attempts to create the task
    async fn create(&self, draft: &TaskDraft) -> Result<CreatedTask, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_source_as_str() {
        assert_eq!(CreationSource::Remote.as_str(), "remote");
        assert_eq!(CreationSource::Direct.as_str(), "direct");
    }

    #[test]
    fn test_draft_builder() {
        let draft = TaskDraft::new(EntityId::new("u-1").unwrap(), "Gas safety check")
            .with_description("Annual CP12")
            .in_portfolio(EntityId::new("p-1").unwrap());

        assert_eq!(draft.title, "Gas safety check");
        assert_eq!(draft.description.as_deref(), Some("Annual CP12"));
        assert_eq!(draft.portfolio_id.as_ref().map(|p| p.as_str()), Some("p-1"));
    }

    #[test]
    fn test_draft_validation() {
        let draft = TaskDraft::new(EntityId::new("u-1").unwrap(), "");
        assert!(draft.validate().is_err());
    }
}
