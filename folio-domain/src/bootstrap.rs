/// Composition root
///
/// Wires repositories and services once, against a shared backend client,
/// with explicit dependency order, and optionally registers the result in
/// a [`ServiceContainer`] for locator-style access by tokens.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folio_backend::client::BackendClient;
/// use folio_backend::config::BackendConfig;
/// use folio_domain::bootstrap::Services;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = BackendConfig::from_env()?;
/// let client = Arc::new(BackendClient::new(config)?);
/// let services = Services::wire(client);
///
/// let session = services.auth.current_session().await;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use folio_backend::client::BackendClient;

use crate::container::{AnyInstance, ServiceContainer};
use crate::models::{Portfolio, Task, TaskImage};
use crate::repository::BackendRepository;
use crate::services::{
    AuthService, BackendUsageTracker, PortfolioService, ProfileService, StorageService, TaskService,
};
use crate::strategy::{DirectTaskCreation, FunctionTaskCreation, TaskCreationStrategy};

/// Well-known container tokens
pub mod tokens {
    pub const PORTFOLIO_REPOSITORY: &str = "repositories.portfolios";
    pub const TASK_REPOSITORY: &str = "repositories.tasks";
    pub const TASK_IMAGE_REPOSITORY: &str = "repositories.task_images";
    pub const STORAGE_SERVICE: &str = "services.storage";
    pub const USAGE_TRACKER: &str = "services.usage";
    pub const AUTH_SERVICE: &str = "services.auth";
    pub const TASK_SERVICE: &str = "services.tasks";
    pub const PORTFOLIO_SERVICE: &str = "services.portfolios";
    pub const PROFILE_SERVICE: &str = "services.profiles";
}

/// The wired service graph
pub struct Services {
    pub auth: Arc<AuthService>,
    pub portfolios: Arc<PortfolioService>,
    pub tasks: Arc<TaskService>,
    pub profiles: Arc<ProfileService>,
    pub storage: Arc<StorageService>,
}

impl Services {
    /// Builds every repository and service against one shared client
    ///
    /// Strategy order is fixed here: the remote function first, the direct
    /// insert as the guaranteed fallback.
    pub fn wire(client: Arc<BackendClient>) -> Services {
        let task_repo = Arc::new(BackendRepository::<Task>::new(client.clone()));
        let portfolio_repo = Arc::new(BackendRepository::<Portfolio>::new(client.clone()));
        let image_repo = Arc::new(BackendRepository::<TaskImage>::new(client.clone()));

        let storage = Arc::new(StorageService::new(client.clone()));
        let usage = Arc::new(BackendUsageTracker::new(client.clone()));

        let strategies: Vec<Arc<dyn TaskCreationStrategy>> = vec![
            Arc::new(FunctionTaskCreation::new(client.clone())),
            Arc::new(DirectTaskCreation::new(task_repo.clone())),
        ];

        Services {
            auth: Arc::new(AuthService::new(client.clone())),
            portfolios: Arc::new(PortfolioService::new(
                portfolio_repo,
                task_repo.clone(),
            )),
            tasks: Arc::new(TaskService::new(
                task_repo,
                image_repo,
                storage.clone(),
                usage,
                strategies,
            )),
            profiles: Arc::new(ProfileService::new(client)),
            storage,
        }
    }
}

/// Builds a container exposing the wired graph under well-known tokens
///
/// Everything is registered as a singleton: resolving the same token twice
/// yields the same instance.
pub fn build_container(client: Arc<BackendClient>) -> ServiceContainer {
    let services = Services::wire(client.clone());
    let container = ServiceContainer::new();

    provide(
        &container,
        tokens::PORTFOLIO_REPOSITORY,
        Arc::new(BackendRepository::<Portfolio>::new(client.clone())),
    );
    provide(
        &container,
        tokens::TASK_REPOSITORY,
        Arc::new(BackendRepository::<Task>::new(client.clone())),
    );
    provide(
        &container,
        tokens::TASK_IMAGE_REPOSITORY,
        Arc::new(BackendRepository::<TaskImage>::new(client.clone())),
    );
    provide(
        &container,
        tokens::USAGE_TRACKER,
        Arc::new(BackendUsageTracker::new(client)),
    );

    provide(&container, tokens::STORAGE_SERVICE, services.storage);
    provide(&container, tokens::AUTH_SERVICE, services.auth);
    provide(&container, tokens::TASK_SERVICE, services.tasks);
    provide(&container, tokens::PORTFOLIO_SERVICE, services.portfolios);
    provide(&container, tokens::PROFILE_SERVICE, services.profiles);

    container
}

fn provide<T: Send + Sync + 'static>(container: &ServiceContainer, token: &str, instance: Arc<T>) {
    container.register(
        token,
        move |_| -> AnyInstance { instance.clone() },
        true,
    );
}
