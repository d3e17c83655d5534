/// In-memory repository for tests and demos
///
/// Implements the full [`Repository`] contract against a `Vec` of rows,
/// applying the same filter/order/limit semantics as the backend by
/// evaluating filters over each row's serialized form. Service tests run
/// against this with no external dependencies and deterministic behavior.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::repository::{Filter, Order, QueryOptions, Repository, TableRecord};

/// In-memory repository over one entity type
pub struct MemoryRepository<T: TableRecord> {
    rows: Mutex<Vec<T>>,
}

impl<T: TableRecord> MemoryRepository<T> {
    /// Creates an empty repository
    pub fn new() -> Self {
        MemoryRepository {
            rows: Mutex::new(Vec::new()),
        }
    }

    /// Creates a repository pre-populated with rows
    pub fn seeded(rows: Vec<T>) -> Self {
        MemoryRepository {
            rows: Mutex::new(rows),
        }
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the repository is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: TableRecord> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: TableRecord + 'static> Repository<T> for MemoryRepository<T> {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<T>, ServiceError> {
        let rows = self.lock();
        Ok(rows.iter().find(|row| row.primary_key() == id).cloned())
    }

    async fn find_all(&self, options: QueryOptions) -> Result<Vec<T>, ServiceError> {
        let rows = self.lock();
        let mut matched: Vec<(Value, T)> = rows
            .iter()
            .map(|row| {
                serde_json::to_value(row)
                    .map(|value| (value, row.clone()))
                    .map_err(|err| {
                        ServiceError::Backend(folio_backend::error::BackendError::Decode(
                            err.to_string(),
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;
        drop(rows);

        matched.retain(|(value, _)| options.filters.iter().all(|f| matches_filter(value, f)));
        matched.sort_by(|a, b| compare_rows(&a.0, &b.0, &options.order));

        if let Some(limit) = options.limit {
            matched.truncate(limit as usize);
        }

        Ok(matched.into_iter().map(|(_, row)| row).collect())
    }

    async fn save(&self, entity: &T) -> Result<(), ServiceError> {
        let mut rows = self.lock();
        match rows
            .iter_mut()
            .find(|row| row.primary_key() == entity.primary_key())
        {
            Some(existing) => *existing = entity.clone(),
            None => rows.push(entity.clone()),
        }
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<(), ServiceError> {
        let mut rows = self.lock();
        rows.retain(|row| row.primary_key() != entity.primary_key());
        Ok(())
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column) == Some(value),
        Filter::In { column, values } => match row.get(column) {
            Some(field) => values.iter().any(|v| v == field),
            None => false,
        },
        Filter::IsNull { column } => row.get(column).map_or(true, Value::is_null),
    }
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    for term in order {
        let left = a.get(&term.column).unwrap_or(&Value::Null);
        let right = b.get(&term.column).unwrap_or(&Value::Null);

        let ordering = compare_values(left, right);
        let ordering = if term.ascending {
            ordering
        } else {
            ordering.reverse()
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
