//! Common library for the payroll services
//!
//! This crate provides the pieces shared by every service that talks to the
//! payroll database: connection pooling, error types, opaque identifiers and
//! paginated queries.

pub mod database;
pub mod error;
pub mod ids;
pub mod pagination;

/// Example usage of the database and pagination modules
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool};
/// use common::pagination::{FilteredQuery, PageRequest, fetch_page};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::new("mysql://root@localhost/payroll");
///     let pool = init_pool(&config).await?;
///     println!("Database health check: {}", health_check(&pool).await?);
///
///     let query = FilteredQuery::new("SELECT org_id, org_name FROM organization")
///         .filter("org_status = ?", "Enabled")
///         .order_by("org_id");
///     let page = fetch_page::<(i64, String)>(&pool, &query, PageRequest::new(1, 10).unwrap()).await?;
///     println!("{} organizations", page.total);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
