/// Task service
///
/// Task CRUD plus the business rules: the status/completed coupling on
/// update, the creation strategy chain, quota enforcement, the five-image
/// ceiling with per-file validation, and the two co-existing image storage
/// schemes (the `task_images` table for everything new, the deprecated
/// `image_url` field still carried by old rows).

use std::sync::Arc;
use validator::Validate;

use folio_backend::storage::DEFAULT_SIGNED_URL_TTL;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::{Task, TaskImage, TaskLabel, TaskPriority, TaskStatus};
use crate::repository::{Filter, Order, QueryOptions, Repository};
use crate::services::storage::{object_path, ObjectStore, UploadFile};
use crate::services::usage::UsageTracker;
use crate::strategy::{CreatedTask, TaskCreationStrategy, TaskDraft};

/// Maximum stored images per task
pub const MAX_IMAGES_PER_TASK: usize = 5;

/// Partial update for a task
///
/// Only present fields change. Clearable fields use the double-`Option`
/// convention. When both `completed` and `status` are present, `completed`
/// wins: true forces `done`, false falls back to the explicit status, then
/// the previous non-done status, then `todo`.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New title
    pub title: Option<String>,

    /// New description (`Some(None)` to clear)
    pub description: Option<Option<String>>,

    /// New completion flag
    pub completed: Option<bool>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New label (`Some(None)` to clear)
    pub label: Option<Option<TaskLabel>>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (`Some(None)` to clear)
    pub due_date: Option<Option<chrono::NaiveDate>>,

    /// New portfolio assignment (`Some(None)` to unassign)
    pub portfolio_id: Option<Option<EntityId>>,
}

/// Extra work to do after a task is created
#[derive(Debug, Clone, Default)]
pub struct CreateTaskOptions {
    /// Due date to set once created
    pub due_date: Option<chrono::NaiveDate>,

    /// Priority to set once created
    pub priority: Option<TaskPriority>,

    /// Images to attach once created
    pub images: Vec<UploadFile>,
}

/// A stored image with its (best-effort) signed read URL
#[derive(Debug, Clone)]
pub struct TaskImageWithUrl {
    /// The tracking row
    pub image: TaskImage,

    /// Signed URL, or empty when signing failed for this entry
    pub url: String,
}

/// Task orchestration service
pub struct TaskService {
    tasks: Arc<dyn Repository<Task>>,
    images: Arc<dyn Repository<TaskImage>>,
    store: Arc<dyn ObjectStore>,
    usage: Arc<dyn UsageTracker>,
    strategies: Vec<Arc<dyn TaskCreationStrategy>>,
}

impl TaskService {
    /// Creates the service over its collaborators
    ///
    /// Strategies are tried in the given order; the last one should be the
    /// guaranteed direct-insert fallback.
    pub fn new(
        tasks: Arc<dyn Repository<Task>>,
        images: Arc<dyn Repository<TaskImage>>,
        store: Arc<dyn ObjectStore>,
        usage: Arc<dyn UsageTracker>,
        strategies: Vec<Arc<dyn TaskCreationStrategy>>,
    ) -> Self {
        TaskService {
            tasks,
            images,
            store,
            usage,
            strategies,
        }
    }

    /// Lists a user's tasks, newest first
    pub async fn list_tasks(&self, user_id: &EntityId) -> Result<Vec<Task>, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .order(Order::desc("created_at"));
        self.tasks.find_all(options).await
    }

    /// Loads one task
    pub async fn get_task(&self, id: &EntityId) -> Result<Option<Task>, ServiceError> {
        self.tasks.find_by_id(id).await
    }

    /// Creates a task through the strategy chain
    ///
    /// Checks the user's quota, then tries each strategy in order until one
    /// succeeds; a strategy failure is logged and the next one is tried,
    /// so the remote route being down never blocks creation. Afterwards the
    /// optional due date/priority are applied, images attached, and the
    /// creation recorded against usage (best-effort).
    pub async fn create_task(
        &self,
        draft: TaskDraft,
        options: CreateTaskOptions,
    ) -> Result<CreatedTask, ServiceError> {
        draft.validate()?;
        self.usage.check(&draft.user_id).await?;

        let mut created = self.run_strategies(&draft).await?;

        if options.due_date.is_some() || options.priority.is_some() {
            if let Some(due_date) = options.due_date {
                created.task.due_date = Some(due_date);
            }
            if let Some(priority) = options.priority {
                created.task.priority = priority;
            }
            created.task.touch();
            self.tasks.save(&created.task).await?;
        }

        if !options.images.is_empty() {
            self.attach_images(&created.task, options.images).await?;
        }

        if let Err(err) = self.usage.record(&draft.user_id).await {
            tracing::warn!(error = %err, "failed to record task usage");
        }

        tracing::info!(
            task_id = %created.task.id,
            source = created.source.as_str(),
            "task created"
        );
        Ok(created)
    }

    async fn run_strategies(&self, draft: &TaskDraft) -> Result<CreatedTask, ServiceError> {
        let mut last_error: Option<ServiceError> = None;

        for strategy in &self.strategies {
            if !strategy.can_handle(draft).await {
                continue;
            }
            match strategy.create(draft).await {
                Ok(created) => return Ok(created),
                Err(err) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %err,
                        "task creation strategy failed, trying next"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(match last_error {
            Some(err) => ServiceError::CreationFailed(err.to_string()),
            None => ServiceError::CreationFailed("no strategy could handle the task".to_string()),
        })
    }

    /// Applies a partial update, enforcing the status/completed coupling
    ///
    /// # Errors
    ///
    /// Returns "Task not found" for a missing id.
    pub async fn update_task(&self, id: &EntityId, update: TaskUpdate) -> Result<Task, ServiceError> {
        let mut task = self
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Task".to_string()))?;

        merge_update(&mut task, update);
        self.tasks.save(&task).await?;
        Ok(task)
    }

    /// Deletes a task; a missing id is a silent no-op
    pub async fn delete_task(&self, id: &EntityId) -> Result<(), ServiceError> {
        match self.tasks.find_by_id(id).await? {
            Some(task) => self.tasks.delete(&task).await,
            None => {
                tracing::debug!(task_id = %id, "delete of missing task ignored");
                Ok(())
            }
        }
    }

    /// Attaches image files to a task
    ///
    /// Enforces the five-image ceiling against the existing count: at the
    /// ceiling the whole batch is rejected; below it the incoming list is
    /// silently truncated to the remaining slots. Each file is validated
    /// immediately before its own upload; a violation aborts the rest of
    /// the batch, and files already uploaded are not rolled back.
    pub async fn attach_images(
        &self,
        task: &Task,
        files: Vec<UploadFile>,
    ) -> Result<Vec<TaskImage>, ServiceError> {
        let existing = self
            .images
            .find_all(QueryOptions::new().filter(Filter::eq("task_id", task.id.as_str())))
            .await?
            .len();

        if existing >= MAX_IMAGES_PER_TASK {
            return Err(ServiceError::Validation(format!(
                "Task already has the maximum of {} images",
                MAX_IMAGES_PER_TASK
            )));
        }

        let remaining = MAX_IMAGES_PER_TASK - existing;
        if files.len() > remaining {
            tracing::warn!(
                task_id = %task.id,
                dropped = files.len() - remaining,
                "truncating image batch to remaining slots"
            );
        }

        let mut stored = Vec::new();
        for file in files.into_iter().take(remaining) {
            file.validate_image()?;

            let path = object_path(&task.user_id, &task.id, &file);
            self.store
                .upload(&path, &file.content_type, file.data.clone())
                .await?;

            let image = TaskImage::new(task.id.clone(), path);
            self.images.save(&image).await?;
            stored.push(image);
        }

        Ok(stored)
    }

    /// Lists a task's images with signed read URLs, creation ascending
    ///
    /// Signing is best-effort per entry: a failure degrades that image to
    /// an empty URL instead of failing the whole list.
    pub async fn list_images(&self, task_id: &EntityId) -> Result<Vec<TaskImageWithUrl>, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("task_id", task_id.as_str()))
            .order(Order::asc("created_at"));
        let images = self.images.find_all(options).await?;

        let mut out = Vec::with_capacity(images.len());
        for image in images {
            let url = match self.store.signed_url(&image.path, DEFAULT_SIGNED_URL_TTL).await {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(
                        image_id = %image.id,
                        error = %err,
                        "failed to sign image URL"
                    );
                    String::new()
                }
            };
            out.push(TaskImageWithUrl { image, url });
        }

        Ok(out)
    }

    /// Removes a stored image: the object first, then the tracking row
    ///
    /// # Errors
    ///
    /// Returns "Image not found" for a missing id.
    pub async fn remove_image(&self, image_id: &EntityId) -> Result<(), ServiceError> {
        let image = self
            .images
            .find_by_id(image_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Image".to_string()))?;

        self.store.remove(&image.path).await?;
        self.images.delete(&image).await?;
        Ok(())
    }

    /// Removes a task's deprecated single-image attachment
    ///
    /// Old rows may still carry a path in `image_url`; this deletes the
    /// object and clears the field. A task without one is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns "Task not found" for a missing id.
    pub async fn remove_legacy_image(&self, task_id: &EntityId) -> Result<Task, ServiceError> {
        let mut task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Task".to_string()))?;

        if let Some(path) = task.image_url.clone() {
            self.store.remove(&path).await?;
            task.image_url = None;
            task.touch();
            self.tasks.save(&task).await?;
        }

        Ok(task)
    }
}

/// Applies a partial update to a task
///
/// The coupling rule: `completed` takes precedence when both it and
/// `status` are present. Setting `completed = true` forces `done`; setting
/// it false restores the explicit status if given, keeps the previous
/// status if it was not `done`, and otherwise falls back to `todo`. A bare
/// `status` change syncs `completed` to match.
fn merge_update(task: &mut Task, update: TaskUpdate) {
    if let Some(title) = update.title {
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = description;
    }
    if let Some(label) = update.label {
        task.label = label;
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }
    if let Some(due_date) = update.due_date {
        task.due_date = due_date;
    }
    if let Some(portfolio_id) = update.portfolio_id {
        task.portfolio_id = portfolio_id;
    }

    match update.completed {
        Some(true) => task.complete(),
        Some(false) => task.reopen(update.status),
        None => {
            if let Some(status) = update.status {
                task.status = status;
                task.completed = status.is_done();
                task.touch();
            } else {
                task.touch();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::draft(EntityId::new("u-1").unwrap(), "Fix boiler", None, None)
    }

    #[test]
    fn test_completed_true_forces_done() {
        let mut task = task();
        merge_update(
            &mut task,
            TaskUpdate {
                completed: Some(true),
                status: Some(TaskStatus::Todo),
                ..Default::default()
            },
        );
        assert!(task.completed);
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn test_completed_false_uses_explicit_status() {
        let mut task = task();
        task.complete();

        merge_update(
            &mut task,
            TaskUpdate {
                completed: Some(false),
                status: Some(TaskStatus::Todo),
                ..Default::default()
            },
        );
        assert!(!task.completed);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_completed_false_falls_back_to_todo() {
        let mut task = task();
        task.complete();

        merge_update(
            &mut task,
            TaskUpdate {
                completed: Some(false),
                ..Default::default()
            },
        );
        assert!(!task.completed);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_bare_status_change_syncs_completed() {
        let mut task = task();
        merge_update(
            &mut task,
            TaskUpdate {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        );
        assert!(task.completed);
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn test_partial_fields_merge() {
        let mut task = task();
        merge_update(
            &mut task,
            TaskUpdate {
                title: Some("Replace boiler".to_string()),
                description: Some(Some("New combi".to_string())),
                priority: Some(TaskPriority::Urgent),
                ..Default::default()
            },
        );
        assert_eq!(task.title, "Replace boiler");
        assert_eq!(task.description.as_deref(), Some("New combi"));
        assert_eq!(task.priority, TaskPriority::Urgent);
        // untouched fields keep their values
        assert!(!task.completed);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_clearing_fields() {
        let mut task = task();
        task.description = Some("old".to_string());
        task.due_date = Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        merge_update(
            &mut task,
            TaskUpdate {
                description: Some(None),
                due_date: Some(None),
                ..Default::default()
            },
        );
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
    }
}
