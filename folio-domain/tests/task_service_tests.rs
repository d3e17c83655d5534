/// Integration tests for `TaskService`
///
/// Runs the service against in-memory collaborators: the creation fallback
/// chain, quota enforcement, the image ceiling and per-file validation,
/// signed-URL degradation, and both image-removal paths.

mod common;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use folio_domain::entity::EntityId;
use folio_domain::error::ServiceError;
use folio_domain::models::{Task, TaskImage, TaskPriority, TaskStatus};
use folio_domain::repository::Repository;
use folio_domain::services::{
    CreateTaskOptions, MemoryUsageTracker, ObjectStore, TaskUpdate, UploadFile,
};
use folio_domain::strategy::{CreationSource, TaskDraft};

use common::{png, user, FailingStrategy, TaskHarness, UnavailableStrategy};

fn draft(title: &str) -> TaskDraft {
    TaskDraft::new(user(), title)
}

#[tokio::test]
async fn creates_task_directly_when_no_remote_strategy() {
    let harness = TaskHarness::new();

    let created = harness
        .service
        .create_task(draft("Fix boiler"), CreateTaskOptions::default())
        .await
        .unwrap();

    assert_eq!(created.source, CreationSource::Direct);
    assert!(!created.task.completed);
    assert_eq!(created.task.status, TaskStatus::Todo);
    assert_eq!(harness.tasks.len(), 1);
}

#[tokio::test]
async fn falls_back_to_direct_insert_when_remote_fails() {
    let harness = TaskHarness::build(
        vec![Arc::new(FailingStrategy)],
        MemoryUsageTracker::unlimited(),
    );

    let created = harness
        .service
        .create_task(draft("Gas safety check"), CreateTaskOptions::default())
        .await
        .unwrap();

    assert_eq!(created.source, CreationSource::Direct);
    assert_eq!(created.task.status, TaskStatus::Todo);
    assert!(!created.task.completed);
    assert_eq!(harness.tasks.len(), 1);
}

#[tokio::test]
async fn skips_strategies_that_cannot_handle() {
    let harness = TaskHarness::build(
        vec![Arc::new(UnavailableStrategy)],
        MemoryUsageTracker::unlimited(),
    );

    let created = harness
        .service
        .create_task(draft("Renew EPC"), CreateTaskOptions::default())
        .await
        .unwrap();

    assert_eq!(created.source, CreationSource::Direct);
}

#[tokio::test]
async fn fails_when_every_strategy_fails() {
    // No direct fallback here: build the service by hand with only the
    // failing remote.
    let tasks = Arc::new(folio_domain::repository::MemoryRepository::<Task>::new());
    let images = Arc::new(folio_domain::repository::MemoryRepository::<TaskImage>::new());
    let store = Arc::new(folio_domain::services::MemoryObjectStore::new());
    let usage = Arc::new(MemoryUsageTracker::unlimited());
    let service = folio_domain::services::TaskService::new(
        tasks.clone(),
        images,
        store,
        usage,
        vec![Arc::new(FailingStrategy)],
    );

    let err = service
        .create_task(draft("Doomed"), CreateTaskOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::CreationFailed(_)));
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn refuses_creation_at_quota_limit() {
    let harness = TaskHarness::build(Vec::new(), MemoryUsageTracker::with_limit(1));

    harness
        .service
        .create_task(draft("First"), CreateTaskOptions::default())
        .await
        .unwrap();

    let err = harness
        .service
        .create_task(draft("Second"), CreateTaskOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::QuotaExceeded { used: 1, limit: 1 }));
    assert_eq!(harness.tasks.len(), 1);
}

#[tokio::test]
async fn applies_due_date_and_priority_after_creation() {
    let harness = TaskHarness::new();
    let due = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let created = harness
        .service
        .create_task(
            draft("Quarterly inspection"),
            CreateTaskOptions {
                due_date: Some(due),
                priority: Some(TaskPriority::High),
                images: Vec::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.task.due_date, Some(due));
    assert_eq!(created.task.priority, TaskPriority::High);

    let stored = harness
        .tasks
        .find_by_id(&created.task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.due_date, Some(due));
    assert_eq!(stored.priority, TaskPriority::High);
}

#[tokio::test]
async fn attaches_images_during_creation() {
    let harness = TaskHarness::new();

    let created = harness
        .service
        .create_task(
            draft("Document damp patch"),
            CreateTaskOptions {
                images: vec![png("a.png", 100), png("b.png", 100)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(harness.images.len(), 2);
    assert_eq!(harness.store.len(), 2);

    let listed = harness.service.list_images(&created.task.id).await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn rejects_batch_when_task_is_at_image_ceiling() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Full task"), CreateTaskOptions::default())
        .await
        .unwrap();

    for i in 0..5 {
        let image = TaskImage::new(created.task.id.clone(), format!("u/{}.png", i));
        harness.images.save(&image).await.unwrap();
    }

    let err = harness
        .service
        .attach_images(&created.task, vec![png("extra.png", 10)])
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(err.to_string().contains("maximum of 5"));
    assert!(harness.store.is_empty());
    assert_eq!(harness.images.len(), 5);
}

#[tokio::test]
async fn truncates_batch_to_remaining_slots() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Nearly full"), CreateTaskOptions::default())
        .await
        .unwrap();

    for i in 0..3 {
        let image = TaskImage::new(created.task.id.clone(), format!("u/{}.png", i));
        harness.images.save(&image).await.unwrap();
    }

    let stored = harness
        .service
        .attach_images(
            &created.task,
            vec![
                png("1.png", 10),
                png("2.png", 10),
                png("3.png", 10),
                png("4.png", 10),
            ],
        )
        .await
        .unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(harness.images.len(), 5);
    assert_eq!(harness.store.len(), 2);
}

#[tokio::test]
async fn oversized_file_aborts_batch_and_never_reaches_storage() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Mixed batch"), CreateTaskOptions::default())
        .await
        .unwrap();

    let oversized = png("big.png", 1_048_577);
    let err = harness
        .service
        .attach_images(
            &created.task,
            vec![png("ok.png", 10), oversized, png("never.png", 10)],
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("big.png"));
    assert!(err.to_string().contains("1 MB"));

    // The first file was already uploaded and is not rolled back; the
    // offending file and everything after it never reach storage.
    assert_eq!(harness.store.len(), 1);
    assert_eq!(harness.images.len(), 1);
}

#[tokio::test]
async fn non_image_mime_is_rejected_before_storage() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Paperwork"), CreateTaskOptions::default())
        .await
        .unwrap();

    let pdf = UploadFile::new("lease.pdf", "application/pdf", vec![0u8; 10]);
    let err = harness
        .service
        .attach_images(&created.task, vec![pdf])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("lease.pdf"));
    assert!(harness.store.is_empty());
    assert!(harness.images.is_empty());
}

#[tokio::test]
async fn list_images_orders_by_creation_and_degrades_failed_signing() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Photos"), CreateTaskOptions::default())
        .await
        .unwrap();

    let base = Utc::now();
    let mut first = TaskImage::new(created.task.id.clone(), "u/first.png");
    first.created_at = base - Duration::seconds(20);
    let mut second = TaskImage::new(created.task.id.clone(), "u/second.png");
    second.created_at = base - Duration::seconds(10);
    harness.images.save(&second).await.unwrap();
    harness.images.save(&first).await.unwrap();

    harness.store.fail_signing_for("u/first.png");

    let listed = harness.service.list_images(&created.task.id).await.unwrap();
    assert_eq!(listed.len(), 2);

    assert_eq!(listed[0].image.path, "u/first.png");
    assert!(listed[0].url.is_empty());

    assert_eq!(listed[1].image.path, "u/second.png");
    assert!(listed[1].url.contains("u/second.png"));
}

#[tokio::test]
async fn remove_image_deletes_object_then_row() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Has photo"), CreateTaskOptions::default())
        .await
        .unwrap();

    let stored = harness
        .service
        .attach_images(&created.task, vec![png("p.png", 10)])
        .await
        .unwrap();

    harness.service.remove_image(&stored[0].id).await.unwrap();
    assert!(harness.store.is_empty());
    assert!(harness.images.is_empty());

    let err = harness
        .service
        .remove_image(&EntityId::new("missing").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Image not found");
}

#[tokio::test]
async fn remove_legacy_image_clears_deprecated_field() {
    let harness = TaskHarness::new();
    let mut task = Task::draft(user(), "Old task", None, None);
    task.image_url = Some("user-1/legacy.jpg".to_string());
    harness.tasks.save(&task).await.unwrap();
    harness
        .store
        .upload("user-1/legacy.jpg", "image/jpeg", bytes::Bytes::from_static(b"x"))
        .await
        .unwrap();

    let updated = harness.service.remove_legacy_image(&task.id).await.unwrap();
    assert!(updated.image_url.is_none());
    assert!(!harness.store.contains("user-1/legacy.jpg"));

    // A task with no legacy image is left unchanged.
    let untouched = harness.service.remove_legacy_image(&task.id).await.unwrap();
    assert!(untouched.image_url.is_none());
}

#[tokio::test]
async fn update_task_couples_completed_and_status() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Toggle me"), CreateTaskOptions::default())
        .await
        .unwrap();

    let done = harness
        .service
        .update_task(
            &created.task.id,
            TaskUpdate {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(done.completed);
    assert_eq!(done.status, TaskStatus::Done);

    let reopened = harness
        .service
        .update_task(
            &created.task.id,
            TaskUpdate {
                completed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.status, TaskStatus::Todo);

    let err = harness
        .service
        .update_task(&EntityId::new("missing").unwrap(), TaskUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Task not found");
}

#[tokio::test]
async fn delete_task_is_noop_for_missing_id() {
    let harness = TaskHarness::new();
    let created = harness
        .service
        .create_task(draft("Short lived"), CreateTaskOptions::default())
        .await
        .unwrap();

    harness.service.delete_task(&created.task.id).await.unwrap();
    assert!(harness.tasks.is_empty());

    // Deleting again is a silent no-op.
    harness.service.delete_task(&created.task.id).await.unwrap();
}

#[tokio::test]
async fn rejects_empty_title() {
    let harness = TaskHarness::new();

    let err = harness
        .service
        .create_task(draft(""), CreateTaskOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(harness.tasks.is_empty());
}
