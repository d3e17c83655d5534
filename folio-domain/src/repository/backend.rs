/// Backend-backed repository
///
/// The one concrete repository implementation used in production: a thin
/// translation from the [`Repository`] contract onto the backend's tabular
/// REST layer via the shared client.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use folio_backend::client::BackendClient;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::repository::{Filter, QueryOptions, Repository, TableRecord};

/// Generic repository over one backend table
pub struct BackendRepository<T: TableRecord> {
    client: Arc<BackendClient>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TableRecord> BackendRepository<T> {
    /// Creates a repository bound to the shared client
    pub fn new(client: Arc<BackendClient>) -> Self {
        BackendRepository {
            client,
            _marker: PhantomData,
        }
    }

    fn key_filter(id: &EntityId) -> Filter {
        Filter::eq(T::primary_key_column(), id.as_str())
    }
}

#[async_trait]
impl<T: TableRecord + 'static> Repository<T> for BackendRepository<T> {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>, ServiceError> {
        let options = QueryOptions::new().filter(Self::key_filter(id)).limit(1);
        let mut rows: Vec<T> = self.client.table(T::TABLE).select(&options).await?;
        Ok(rows.pop())
    }

    async fn find_all(&self, options: QueryOptions) -> Result<Vec<T>, ServiceError> {
        let rows = self.client.table(T::TABLE).select(&options).await?;
        Ok(rows)
    }

    async fn save(&self, entity: &T) -> Result<(), ServiceError> {
        self.client
            .table(T::TABLE)
            .upsert(entity, &T::primary_key_column())
            .await?;
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<(), ServiceError> {
        self.client
            .table(T::TABLE)
            .delete(&[Self::key_filter(entity.primary_key())])
            .await?;
        Ok(())
    }
}
