//! Paginated queries over parameterized SQL
//!
//! A [`FilteredQuery`] holds a fixed `SELECT ... FROM ...` head, a list of
//! optional filter clauses and the values bound to their placeholders, in
//! order. [`fetch_page`] runs it twice: once wrapped in a `COUNT(*)` subquery
//! and once with `LIMIT ? OFFSET ?` appended. Both runs bind the identical
//! parameter list.

use serde::Serialize;
use sqlx::{Arguments, FromRow, MySqlPool, mysql::MySqlArguments, mysql::MySqlRow};
use tracing::debug;

use crate::error::{DatabaseError, DatabaseResult};

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

/// Fixed query shape plus optional `AND` filters
#[derive(Debug, Clone)]
pub struct FilteredQuery {
    head: String,
    conditions: Vec<String>,
    order_by: Option<String>,
    params: Vec<SqlParam>,
}

impl FilteredQuery {
    /// Start from a `SELECT ... FROM ...` head without a `WHERE` clause
    pub fn new(head: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            conditions: Vec::new(),
            order_by: None,
            params: Vec::new(),
        }
    }

    /// Add a condition containing exactly one `?` placeholder
    pub fn filter(mut self, condition: &str, value: impl Into<SqlParam>) -> Self {
        self.conditions.push(condition.to_string());
        self.params.push(value.into());
        self
    }

    /// Add a condition only when a value is present
    pub fn filter_opt<V: Into<SqlParam>>(self, condition: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.filter(condition, value),
            None => self,
        }
    }

    /// Deterministic ordering for stable page windows
    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    /// Parameters in placeholder order
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// The base query with all filters applied
    pub fn sql(&self) -> String {
        let mut sql = self.head.trim().to_string();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        sql
    }

    /// `SELECT COUNT(*)` over the base query
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM ({}) AS t", self.sql())
    }

    /// The base query restricted to one window
    pub fn page_sql(&self) -> String {
        format!("{} LIMIT ? OFFSET ?", self.sql())
    }

    fn arguments(&self, window: Option<(i64, i64)>) -> DatabaseResult<MySqlArguments> {
        let mut args = MySqlArguments::default();
        for param in &self.params {
            let added = match param {
                SqlParam::Text(value) => args.add(value.clone()),
                SqlParam::Int(value) => args.add(*value),
                SqlParam::Float(value) => args.add(*value),
            };
            added.map_err(|e| DatabaseError::Argument(e.to_string()))?;
        }
        if let Some((limit, offset)) = window {
            args.add(limit)
                .map_err(|e| DatabaseError::Argument(e.to_string()))?;
            args.add(offset)
                .map_err(|e| DatabaseError::Argument(e.to_string()))?;
        }
        Ok(args)
    }
}

/// Requested window, both values 1-based and positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Returns `None` when either value is zero
    pub fn new(page: u32, size: u32) -> Option<Self> {
        if page == 0 || size == 0 {
            None
        } else {
            Some(Self { page, size })
        }
    }

    /// Rows skipped before this window
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// Page envelope returned to API consumers
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Rows matching the filters across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub is_first: bool,
    pub is_last: bool,
    pub is_empty: bool,
    /// Rows on this page
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Package one window of rows with its navigation metadata
    pub fn new(content: Vec<T>, total: u64, request: PageRequest) -> Self {
        let size = u64::from(request.size);
        let offset = request.offset();
        let total_pages = total / size + u64::from(total % size > 0);
        let row_count = content.len() as u64;

        Self {
            total,
            page: request.page,
            page_size: request.size,
            total_pages,
            is_first: request.page == 1,
            is_last: offset + size >= total,
            is_empty: row_count == 0,
            total_elements: row_count,
            content,
        }
    }

    /// Post-process every row, keeping the metadata
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let content = self
            .content
            .into_iter()
            .map(f)
            .collect::<Result<Vec<U>, E>>()?;

        Ok(Page {
            content,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            is_first: self.is_first,
            is_last: self.is_last,
            is_empty: self.is_empty,
            total_elements: self.total_elements,
        })
    }
}

/// Count the matching rows, then fetch one window of them
pub async fn fetch_page<R>(
    pool: &MySqlPool,
    query: &FilteredQuery,
    request: PageRequest,
) -> DatabaseResult<Page<R>>
where
    R: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let count_sql = query.count_sql();
    let total: i64 = sqlx::query_scalar_with(&count_sql, query.arguments(None)?)
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::Query)?;
    let total = u64::try_from(total).unwrap_or(0);

    let limit = i64::from(request.size);
    let offset = i64::try_from(request.offset())
        .map_err(|_| DatabaseError::Argument("page offset out of range".to_string()))?;

    let page_sql = query.page_sql();
    let rows: Vec<R> = sqlx::query_as_with(&page_sql, query.arguments(Some((limit, offset)))?)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::Query)?;

    debug!(
        total,
        page = request.page,
        size = request.size,
        rows = rows.len(),
        "Fetched page"
    );

    Ok(Page::new(rows, total, request))
}
