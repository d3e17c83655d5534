/// Portfolio service
///
/// Portfolio CRUD plus the grouped portfolio/tasks read the dashboard
/// renders from. Deleting a portfolio does not cascade: callers that want
/// the tasks gone must call `delete_portfolio_tasks` first, explicitly.

use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityId;
use crate::error::ServiceError;
use crate::models::{Portfolio, Task};
use crate::repository::{Filter, Order, QueryOptions, Repository};

/// Partial update for a portfolio
///
/// Only present fields change. `description` uses the double-`Option`
/// convention: `Some(None)` clears it, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct PortfolioUpdate {
    /// New name
    pub name: Option<String>,

    /// New description (`Some(None)` to clear)
    pub description: Option<Option<String>>,
}

/// A portfolio paired with its tasks
#[derive(Debug, Clone)]
pub struct PortfolioWithTasks {
    /// The portfolio
    pub portfolio: Portfolio,

    /// Tasks assigned to it, creation ascending
    pub tasks: Vec<Task>,
}

/// Portfolio orchestration service
pub struct PortfolioService {
    portfolios: Arc<dyn Repository<Portfolio>>,
    tasks: Arc<dyn Repository<Task>>,
}

impl PortfolioService {
    /// Creates the service over its repositories
    pub fn new(
        portfolios: Arc<dyn Repository<Portfolio>>,
        tasks: Arc<dyn Repository<Task>>,
    ) -> Self {
        PortfolioService { portfolios, tasks }
    }

    /// Lists a user's portfolios, creation ascending
    pub async fn list_portfolios(&self, user_id: &EntityId) -> Result<Vec<Portfolio>, ServiceError> {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", user_id.as_str()))
            .order(Order::asc("created_at"));
        self.portfolios.find_all(options).await
    }

    /// Lists a user's portfolios each paired with its tasks
    ///
    /// Loads the portfolios, then all tasks whose `portfolio_id` falls in
    /// that set in one query, and groups client-side. Every portfolio
    /// appears in the result even with zero tasks. A task referencing an
    /// unknown portfolio id is dropped from the grouping; that cannot
    /// normally occur, since the tasks were fetched by filtering on known
    /// ids.
    pub async fn list_portfolios_with_tasks(
        &self,
        user_id: &EntityId,
    ) -> Result<Vec<PortfolioWithTasks>, ServiceError> {
        let portfolios = self.list_portfolios(user_id).await?;
        if portfolios.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<serde_json::Value> = portfolios.iter().map(|p| (&p.id).into()).collect();
        let options = QueryOptions::new()
            .filter(Filter::is_in("portfolio_id", ids))
            .order(Order::asc("created_at"));
        let tasks = self.tasks.find_all(options).await?;

        let mut grouped: HashMap<String, Vec<Task>> = HashMap::new();
        for task in tasks {
            let Some(key) = task.portfolio_id.as_ref().map(|p| p.as_str().to_string()) else {
                continue;
            };
            grouped.entry(key).or_default().push(task);
        }

        Ok(portfolios
            .into_iter()
            .map(|portfolio| {
                let tasks = grouped.remove(portfolio.id.as_str()).unwrap_or_default();
                PortfolioWithTasks { portfolio, tasks }
            })
            .collect())
    }

    /// Creates a portfolio
    pub async fn create_portfolio(
        &self,
        user_id: EntityId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Portfolio, ServiceError> {
        let portfolio = Portfolio::new(user_id, name, description)?;
        self.portfolios.save(&portfolio).await?;

        tracing::info!(portfolio_id = %portfolio.id, "portfolio created");
        Ok(portfolio)
    }

    /// Applies a partial update
    ///
    /// # Errors
    ///
    /// Returns "Portfolio not found" for a missing id, and a validation
    /// error when renaming to an empty name.
    pub async fn update_portfolio(
        &self,
        id: &EntityId,
        update: PortfolioUpdate,
    ) -> Result<Portfolio, ServiceError> {
        let mut portfolio = self
            .portfolios
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Portfolio".to_string()))?;

        if let Some(name) = update.name {
            portfolio.rename(name)?;
        }
        if let Some(description) = update.description {
            portfolio.set_description(description);
        }

        self.portfolios.save(&portfolio).await?;
        Ok(portfolio)
    }

    /// Deletes a portfolio
    ///
    /// A missing id is a silent no-op. Tasks are **not** cascaded; call
    /// [`Self::delete_portfolio_tasks`] first when that is wanted.
    pub async fn delete_portfolio(&self, id: &EntityId) -> Result<(), ServiceError> {
        match self.portfolios.find_by_id(id).await? {
            Some(portfolio) => {
                self.portfolios.delete(&portfolio).await?;
                tracing::info!(portfolio_id = %id, "portfolio deleted");
                Ok(())
            }
            None => {
                tracing::debug!(portfolio_id = %id, "delete of missing portfolio ignored");
                Ok(())
            }
        }
    }

    /// Deletes every task in a portfolio, one delete per row, in parallel
    pub async fn delete_portfolio_tasks(&self, portfolio_id: &EntityId) -> Result<(), ServiceError> {
        let options =
            QueryOptions::new().filter(Filter::eq("portfolio_id", portfolio_id.as_str()));
        let tasks = self.tasks.find_all(options).await?;
        let count = tasks.len();

        try_join_all(tasks.iter().map(|task| self.tasks.delete(task))).await?;

        tracing::info!(portfolio_id = %portfolio_id, count, "portfolio tasks deleted");
        Ok(())
    }
}
