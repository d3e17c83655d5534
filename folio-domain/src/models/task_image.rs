/// Task image entity
///
/// One row per stored attachment. The `path` is the object key inside the
/// `task-attachments` bucket, shaped
/// `{user_id}/{task_id}-{epoch_millis}-{base36}.{ext}` so keys are
/// namespaced per user and collision-resistant without a central sequence.
///
/// Note the primary-key column: `image_id`, not the `task_image_id` the
/// naming convention would produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::repository::TableRecord;

/// Stored task attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskImage {
    /// Primary key
    #[serde(rename = "image_id")]
    pub id: EntityId,

    /// Parent task
    pub task_id: EntityId,

    /// Object key inside the attachments bucket
    pub path: String,

    /// When the image was stored
    pub created_at: DateTime<Utc>,
}

impl TaskImage {
    /// Creates a tracking row for a freshly uploaded object
    pub fn new(task_id: EntityId, path: impl Into<String>) -> Self {
        TaskImage {
            id: EntityId::generate(),
            task_id,
            path: path.into(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for TaskImage {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl TableRecord for TaskImage {
    const TABLE: &'static str = "task_images";

    // The convention would derive `task_image_id`; the table keys on
    // `image_id`.
    fn primary_key_column() -> String {
        "image_id".to_string()
    }

    fn primary_key(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_column_is_overridden() {
        assert_eq!(TaskImage::primary_key_column(), "image_id");
    }

    #[test]
    fn test_serializes_to_column_names() {
        let image = TaskImage::new(EntityId::new("t-1").unwrap(), "u-1/t-1-1-ab.jpg");
        let value = serde_json::to_value(image).unwrap();
        assert!(value.get("image_id").is_some());
        assert_eq!(value.get("task_id").and_then(|v| v.as_str()), Some("t-1"));
        assert_eq!(
            value.get("path").and_then(|v| v.as_str()),
            Some("u-1/t-1-1-ab.jpg")
        );
    }
}
