/// Task entity
///
/// Tasks are the unit of work in Folio: a maintenance job, a compliance
/// deadline, an inspection. A task may belong to a portfolio or float
/// unassigned.
///
/// # Status / completed coupling
///
/// The row stores both a `completed` flag and a `status` string and the two
/// must agree: `completed = true` implies `status = "done"`. The merge rule
/// lives in `TaskService::update_task`; the helpers here keep the invariant
/// for direct entity mutation.
///
/// # Images
///
/// Two storage schemes co-exist. New attachments are rows in `task_images`;
/// `image_url` is the deprecated single-image path that older tasks may
/// still carry. All new writes go through the image table.
///
/// # Schema
///
/// ```text
/// tasks (
///     task_id       text primary key,
///     user_id       text not null,
///     title         text not null,
///     description   text,
///     completed     boolean not null default false,
///     status        text not null default 'todo',
///     label         text,
///     priority      text not null default 'medium',
///     due_date      date,
///     image_url     text,
///     portfolio_id  text,
///     created_at    timestamptz not null,
///     updated_at    timestamptz not null
/// )
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityId};
use crate::error::ServiceError;
use crate::repository::TableRecord;

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Open task
    Todo,

    /// Completed task
    Done,
}

impl TaskStatus {
    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Done => "done",
        }
    }

    /// Whether this status means the task is finished
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    /// Converts priority to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "urgent",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Canonical task label taxonomy
///
/// Rows written before the taxonomy settled may carry other values, so the
/// label is a validated string rather than a closed enum: a legacy value
/// must survive a read-modify-write round trip unchanged.
pub const CANONICAL_LABELS: [&str; 10] = [
    "maintenance",
    "compliance",
    "finance",
    "admin",
    "lettings",
    "inspection",
    "refurb",
    "legal",
    "operations",
    "tenant",
];

/// Task label value object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskLabel(String);

impl TaskLabel {
    /// Creates a label, rejecting empty input
    ///
    /// Input is trimmed and lowercased. Values outside the canonical
    /// taxonomy are accepted (legacy data) but report `is_canonical` false.
    pub fn new(value: impl Into<String>) -> Result<Self, ServiceError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() {
            return Err(ServiceError::Validation(
                "Task label must not be empty".to_string(),
            ));
        }
        Ok(TaskLabel(value))
    }

    /// Whether the label belongs to the current taxonomy
    pub fn is_canonical(&self) -> bool {
        CANONICAL_LABELS.contains(&self.0.as_str())
    }

    /// Returns the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Primary key
    #[serde(rename = "task_id")]
    pub id: EntityId,

    /// Owning user
    pub user_id: EntityId,

    /// Short title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Completion flag (must agree with `status`)
    pub completed: bool,

    /// Completion status (must agree with `completed`)
    pub status: TaskStatus,

    /// Optional label from the taxonomy (or a legacy value)
    pub label: Option<TaskLabel>,

    /// Priority, defaults to medium
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Deprecated single-image path; new attachments use `task_images`
    pub image_url: Option<String>,

    /// Containing portfolio; None for unassigned tasks
    pub portfolio_id: Option<EntityId>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a fresh open task with a generated id
    pub fn draft(
        user_id: EntityId,
        title: impl Into<String>,
        description: Option<String>,
        portfolio_id: Option<EntityId>,
    ) -> Self {
        let now = Utc::now();
        Task {
            id: EntityId::generate(),
            user_id,
            title: title.into(),
            description,
            completed: false,
            status: TaskStatus::Todo,
            label: None,
            priority: TaskPriority::default(),
            due_date: None,
            image_url: None,
            portfolio_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the task done, keeping `completed` and `status` in agreement
    pub fn complete(&mut self) {
        self.completed = true;
        self.status = TaskStatus::Done;
        self.touch();
    }

    /// Reopens the task with the given status (defaults to todo)
    pub fn reopen(&mut self, status: Option<TaskStatus>) {
        self.completed = false;
        self.status = match status {
            Some(status) => status,
            None if self.status.is_done() => TaskStatus::Todo,
            None => self.status,
        };
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Entity for Task {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl TableRecord for Task {
    const TABLE: &'static str = "tasks";

    fn primary_key(&self) -> &EntityId {
        &self.id
    }
}
