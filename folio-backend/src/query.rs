/// Table query building and execution
///
/// This module implements the filter/order/limit query surface over the
/// backend's tabular REST layer. Filters are ANDed; an array-valued filter
/// is a membership test, a null filter is an `is null` test, and everything
/// else is column equality.
///
/// # Example
///
/// ```no_run
/// use folio_backend::query::{Filter, Order, QueryOptions};
///
/// let options = QueryOptions::new()
///     .filter(Filter::eq("user_id", "u-1"))
///     .filter(Filter::is_null("portfolio_id"))
///     .order(Order::asc("created_at"))
///     .limit(20);
/// ```

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};

/// A single column filter
///
/// Filters in a query are ANDed together.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq { column: String, value: Value },

    /// Column value is a member of the list
    In { column: String, values: Vec<Value> },

    /// Column is null
    IsNull { column: String },
}

impl Filter {
    /// Equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Membership filter
    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            column: column.into(),
            values,
        }
    }

    /// Null filter
    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull {
            column: column.into(),
        }
    }

    /// Renders the filter as a `(column, operator.value)` query pair
    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", render_scalar(value))),
            Filter::In { column, values } => {
                let list = values.iter().map(render_list_item).collect::<Vec<_>>().join(",");
                (column.clone(), format!("in.({})", list))
            }
            Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
        }
    }
}

/// A single ordering term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to order by
    pub column: String,

    /// Ascending when true, descending otherwise
    pub ascending: bool,
}

impl Order {
    /// Ascending order on a column
    pub fn asc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            ascending: true,
        }
    }

    /// Descending order on a column
    pub fn desc(column: impl Into<String>) -> Self {
        Order {
            column: column.into(),
            ascending: false,
        }
    }

    fn render(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Options for a `find_all`-style read
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Filters, ANDed together
    pub filters: Vec<Filter>,

    /// Ordering terms, applied in sequence
    pub order: Vec<Order>,

    /// Maximum number of rows
    pub limit: Option<u32>,
}

impl QueryOptions {
    /// Creates empty options (no filters, no order, no limit)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds an ordering term
    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the row limit
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the options as REST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> =
            self.filters.iter().map(Filter::to_param).collect();

        if !self.order.is_empty() {
            let rendered = self.order.iter().map(Order::render).collect::<Vec<_>>().join(",");
            params.push(("order".to_string(), rendered));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// Renders a scalar filter value
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Renders a value inside an `in.(...)` list
///
/// Strings are double-quoted so embedded commas cannot split the list.
fn render_list_item(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => render_scalar(other),
    }
}

/// A query bound to one table
///
/// Obtained from [`BackendClient::table`]. Each method issues exactly one
/// request; any non-2xx response surfaces as [`BackendError::Api`] with the
/// backend's message.
pub struct TableQuery<'a> {
    client: &'a BackendClient,
    table: String,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(client: &'a BackendClient, table: impl Into<String>) -> Self {
        TableQuery {
            client,
            table: table.into(),
        }
    }

    /// Reads rows matching the options
    pub async fn select<T: DeserializeOwned>(&self, options: &QueryOptions) -> BackendResult<Vec<T>> {
        let url = self.client.config().rest_url(&self.table);
        let mut params = options.to_params();
        params.push(("select".to_string(), "*".to_string()));

        let request = self
            .client
            .authed_request(Method::GET, &url)
            .await
            .query(&params);
        let response = self.client.send(request).await?;

        decode_rows(response).await
    }

    /// Inserts one row, returning the stored representation
    pub async fn insert<T: Serialize, R: DeserializeOwned>(&self, row: &T) -> BackendResult<R> {
        let url = self.client.config().rest_url(&self.table);
        let request = self
            .client
            .authed_request(Method::POST, &url)
            .await
            .header("Prefer", "return=representation")
            .json(row);
        let response = self.client.send(request).await?;

        let mut rows: Vec<R> = decode_rows(response).await?;
        rows.pop()
            .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))
    }

    /// Inserts one row unless its conflict target already exists
    ///
    /// Duplicate rows are silently ignored, which makes the call idempotent.
    pub async fn insert_if_absent<T: Serialize>(
        &self,
        row: &T,
        conflict_column: &str,
    ) -> BackendResult<()> {
        let url = self.client.config().rest_url(&self.table);
        let request = self
            .client
            .authed_request(Method::POST, &url)
            .await
            .query(&[("on_conflict", conflict_column)])
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(row);
        self.client.send(request).await.map(|_| ())
    }

    /// Upserts one row keyed on the conflict column
    ///
    /// Insert-or-update semantics: an existing row with the same key is
    /// replaced column-by-column.
    pub async fn upsert<T: Serialize>(&self, row: &T, conflict_column: &str) -> BackendResult<()> {
        let url = self.client.config().rest_url(&self.table);
        let request = self
            .client
            .authed_request(Method::POST, &url)
            .await
            .query(&[("on_conflict", conflict_column)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);
        self.client.send(request).await.map(|_| ())
    }

    /// Applies a partial update to all rows matching the filters
    pub async fn update<T: Serialize>(&self, patch: &T, filters: &[Filter]) -> BackendResult<()> {
        let url = self.client.config().rest_url(&self.table);
        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let request = self
            .client
            .authed_request(Method::PATCH, &url)
            .await
            .query(&params)
            .header("Prefer", "return=minimal")
            .json(patch);
        self.client.send(request).await.map(|_| ())
    }

    /// Deletes all rows matching the filters
    pub async fn delete(&self, filters: &[Filter]) -> BackendResult<()> {
        let url = self.client.config().rest_url(&self.table);
        let params: Vec<(String, String)> = filters.iter().map(Filter::to_param).collect();
        let request = self
            .client
            .authed_request(Method::DELETE, &url)
            .await
            .query(&params);
        self.client.send(request).await.map(|_| ())
    }
}

/// Decodes a row-set response body
async fn decode_rows<T: DeserializeOwned>(response: reqwest::Response) -> BackendResult<Vec<T>> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter_param() {
        let (column, value) = Filter::eq("user_id", "u-1").to_param();
        assert_eq!(column, "user_id");
        assert_eq!(value, "eq.u-1");

        let (_, value) = Filter::eq("completed", true).to_param();
        assert_eq!(value, "eq.true");

        let (_, value) = Filter::eq("tasks_limit", 50).to_param();
        assert_eq!(value, "eq.50");
    }

    #[test]
    fn test_in_filter_param() {
        let filter = Filter::is_in("portfolio_id", vec![json!("p-1"), json!("p-2")]);
        let (column, value) = filter.to_param();
        assert_eq!(column, "portfolio_id");
        assert_eq!(value, "in.(\"p-1\",\"p-2\")");
    }

    #[test]
    fn test_in_filter_quotes_commas() {
        let filter = Filter::is_in("name", vec![json!("a,b")]);
        let (_, value) = filter.to_param();
        assert_eq!(value, "in.(\"a,b\")");
    }

    #[test]
    fn test_is_null_filter_param() {
        let (column, value) = Filter::is_null("portfolio_id").to_param();
        assert_eq!(column, "portfolio_id");
        assert_eq!(value, "is.null");
    }

    #[test]
    fn test_order_rendering() {
        assert_eq!(Order::asc("created_at").render(), "created_at.asc");
        assert_eq!(Order::desc("updated_at").render(), "updated_at.desc");
    }

    #[test]
    fn test_options_to_params() {
        let options = QueryOptions::new()
            .filter(Filter::eq("user_id", "u-1"))
            .filter(Filter::is_null("portfolio_id"))
            .order(Order::asc("created_at"))
            .order(Order::desc("task_id"))
            .limit(10);

        let params = options.to_params();
        assert_eq!(
            params,
            vec![
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("portfolio_id".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.asc,task_id.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_options_have_no_params() {
        assert!(QueryOptions::new().to_params().is_empty());
    }
}
