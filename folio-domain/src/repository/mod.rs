/// Repository layer
///
/// Repositories translate entities to and from backend rows behind one
/// generic contract. They hold no cache: every call re-reads from the
/// backend, and any backend error surfaces unchanged. An error means
/// whole-operation failure, with no retry and no partial success.
///
/// # Contract
///
/// - `find_by_id`: single row by primary key, `None` when absent
/// - `find_all`: filters (ANDed; a list value is a membership test, a null
///   value an is-null test, anything else equality), ordering, limit
/// - `save`: upsert keyed on the primary key
/// - `delete`: remove by the entity's primary key
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folio_backend::client::BackendClient;
/// use folio_domain::models::Task;
/// use folio_domain::repository::{BackendRepository, Filter, QueryOptions, Repository};
///
/// # async fn example(client: Arc<BackendClient>) -> Result<(), folio_domain::error::ServiceError> {
/// let tasks = BackendRepository::<Task>::new(client);
/// let open = tasks
///     .find_all(QueryOptions::new().filter(Filter::eq("completed", false)))
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod backend;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity::EntityId;
use crate::error::ServiceError;

pub use backend::BackendRepository;
pub use folio_backend::query::{Filter, Order, QueryOptions};
pub use memory::MemoryRepository;

/// Binds an entity type to its backend table
pub trait TableRecord: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Table name
    const TABLE: &'static str;

    /// Primary-key column
    ///
    /// Default inference: strip a trailing `s` from the table name and
    /// append `_id` (`portfolios` → `portfolio_id`). Override where the
    /// convention is wrong (`task_images` keys on `image_id`).
    fn primary_key_column() -> String {
        let singular = Self::TABLE.strip_suffix('s').unwrap_or(Self::TABLE);
        format!("{}_id", singular)
    }

    /// The entity's primary-key value
    fn primary_key(&self) -> &EntityId;
}

/// Generic CRUD contract over one table
#[async_trait]
pub trait Repository<T: TableRecord>: Send + Sync {
    /// Loads one entity by primary key
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>, ServiceError>;

    /// Loads all entities matching the options
    async fn find_all(&self, options: QueryOptions) -> Result<Vec<T>, ServiceError>;

    /// Inserts or updates the entity, keyed on its primary key
    async fn save(&self, entity: &T) -> Result<(), ServiceError>;

    /// Deletes the entity by its primary key
    async fn delete(&self, entity: &T) -> Result<(), ServiceError>;
}
