#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// Builds service graphs over the in-memory repository, object store, and
/// usage tracker, plus strategy doubles for exercising the creation
/// fallback chain. No live backend required.

use async_trait::async_trait;
use std::sync::Arc;

use folio_backend::error::BackendError;
use folio_domain::entity::EntityId;
use folio_domain::error::ServiceError;
use folio_domain::models::{Portfolio, Task, TaskImage};
use folio_domain::repository::MemoryRepository;
use folio_domain::services::{
    MemoryObjectStore, MemoryUsageTracker, PortfolioService, TaskService, UploadFile,
};
use folio_domain::strategy::{
    CreatedTask, DirectTaskCreation, TaskCreationStrategy, TaskDraft,
};

/// Initializes test logging once
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// The test user
pub fn user() -> EntityId {
    EntityId::new("user-1").unwrap()
}

/// A small valid PNG upload of the given size
pub fn png(name: &str, len: usize) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0u8; len])
}

/// A strategy that always reports available and always fails
///
/// Stands in for the remote function being unreachable or returning
/// non-2xx.
pub struct FailingStrategy;

#[async_trait]
impl TaskCreationStrategy for FailingStrategy {
    fn name(&self) -> &str {
        "remote-down"
    }

    async fn can_handle(&self, _draft: &TaskDraft) -> bool {
        true
    }

    async fn create(&self, _draft: &TaskDraft) -> Result<CreatedTask, ServiceError> {
        Err(ServiceError::Backend(BackendError::api(
            503,
            "service unavailable",
        )))
    }
}

/// A strategy that reports it cannot handle anything
///
/// Stands in for the remote route with no gateway configured.
pub struct UnavailableStrategy;

#[async_trait]
impl TaskCreationStrategy for UnavailableStrategy {
    fn name(&self) -> &str {
        "remote-unconfigured"
    }

    async fn can_handle(&self, _draft: &TaskDraft) -> bool {
        false
    }

    async fn create(&self, _draft: &TaskDraft) -> Result<CreatedTask, ServiceError> {
        Err(ServiceError::CreationFailed(
            "strategy is not configured".to_string(),
        ))
    }
}

/// Everything a task-service test needs
pub struct TaskHarness {
    pub service: TaskService,
    pub tasks: Arc<MemoryRepository<Task>>,
    pub images: Arc<MemoryRepository<TaskImage>>,
    pub store: Arc<MemoryObjectStore>,
    pub usage: Arc<MemoryUsageTracker>,
}

impl TaskHarness {
    /// Direct-insert only, unlimited quota
    pub fn new() -> Self {
        Self::build(Vec::new(), MemoryUsageTracker::unlimited())
    }

    /// Custom leading strategies (direct insert is always appended last)
    /// and a custom usage tracker
    pub fn build(
        leading: Vec<Arc<dyn TaskCreationStrategy>>,
        usage: MemoryUsageTracker,
    ) -> Self {
        init_tracing();

        let tasks = Arc::new(MemoryRepository::<Task>::new());
        let images = Arc::new(MemoryRepository::<TaskImage>::new());
        let store = Arc::new(MemoryObjectStore::new());
        let usage = Arc::new(usage);

        let mut strategies = leading;
        strategies.push(Arc::new(DirectTaskCreation::new(tasks.clone())));

        let service = TaskService::new(
            tasks.clone(),
            images.clone(),
            store.clone(),
            usage.clone(),
            strategies,
        );

        TaskHarness {
            service,
            tasks,
            images,
            store,
            usage,
        }
    }
}

/// Everything a portfolio-service test needs
pub struct PortfolioHarness {
    pub service: PortfolioService,
    pub portfolios: Arc<MemoryRepository<Portfolio>>,
    pub tasks: Arc<MemoryRepository<Task>>,
}

impl PortfolioHarness {
    pub fn new() -> Self {
        init_tracing();

        let portfolios = Arc::new(MemoryRepository::<Portfolio>::new());
        let tasks = Arc::new(MemoryRepository::<Task>::new());
        let service = PortfolioService::new(portfolios.clone(), tasks.clone());

        PortfolioHarness {
            service,
            portfolios,
            tasks,
        }
    }
}
