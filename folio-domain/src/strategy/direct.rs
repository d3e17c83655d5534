/// Direct-insert creation strategy
///
/// The guaranteed fallback: builds an open task (`completed = false`,
/// `status = "todo"`) and inserts it through the task repository. Always
/// reports it can handle a draft.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::Task;
use crate::repository::Repository;
use crate::strategy::{CreatedTask, CreationSource, TaskCreationStrategy, TaskDraft};

/// Direct-insert strategy
pub struct DirectTaskCreation {
    tasks: Arc<dyn Repository<Task>>,
}

impl DirectTaskCreation {
    /// Creates the strategy over a task repository
    pub fn new(tasks: Arc<dyn Repository<Task>>) -> Self {
        DirectTaskCreation { tasks }
    }
}

#[async_trait]
impl TaskCreationStrategy for DirectTaskCreation {
    fn name(&self) -> &str {
        "direct"
    }

    async fn can_handle(&self, _draft: &TaskDraft) -> bool {
        true
    }

    async fn create(&self, draft: &TaskDraft) -> Result<CreatedTask, ServiceError> {
        let task = Task::draft(
            draft.user_id.clone(),
            draft.title.clone(),
            draft.description.clone(),
            draft.portfolio_id.clone(),
        );
        self.tasks.save(&task).await?;

        tracing::debug!(task_id = %task.id, "task created by direct insert");

        Ok(CreatedTask {
            task,
            source: CreationSource::Direct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::models::TaskStatus;
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn test_creates_open_todo_task() {
        let repo = Arc::new(MemoryRepository::<Task>::new());
        let strategy = DirectTaskCreation::new(repo.clone());
        let draft = TaskDraft::new(EntityId::new("u-1").unwrap(), "Fix boiler");

        assert!(strategy.can_handle(&draft).await);
        let created = strategy.create(&draft).await.unwrap();

        assert_eq!(created.source, CreationSource::Direct);
        assert!(!created.task.completed);
        assert_eq!(created.task.status, TaskStatus::Todo);
        assert_eq!(repo.len(), 1);
    }
}
