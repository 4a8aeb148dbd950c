//! Salary KPI (tunkin) repository

use common::{
    error::{DatabaseError, DatabaseResult},
    pagination::{FilteredQuery, Page, PageRequest, fetch_page},
};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{error, info};

use crate::models::{SalaryKpiRecord, TunkinRow};

/// Rows per `INSERT` statement; three placeholders each
const UPSERT_BATCH_SIZE: usize = 1000;

/// Escape character for `LIKE` patterns; independent of `NO_BACKSLASH_ESCAPES`
const LIKE_ESCAPE: char = '!';

/// `%term%` pattern that matches `term` literally
fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Filters accepted by the listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TunkinFilter {
    pub periode: String,
    pub nipam: Option<String>,
    pub nama: Option<String>,
    pub org_id: Option<i64>,
}

#[derive(Clone)]
pub struct TunkinRepository {
    pool: MySqlPool,
    table: String,
}

impl TunkinRepository {
    /// `table` must already be validated as a plain identifier
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Base listing query with the optional filters applied
    pub fn list_query(&self, filter: &TunkinFilter) -> FilteredQuery {
        let head = format!(
            r#"
            SELECT
                sk.periode AS periode,
                sk.nipam AS nipam,
                ep.emp_name AS nama,
                CAST(em.emp_org_id AS SIGNED) AS org_id,
                org.org_name AS org_name,
                CAST(sk.nominal AS DOUBLE) AS nominal
            FROM
                {} AS sk
                LEFT JOIN employee AS em ON em.emp_nipam = sk.nipam
                LEFT JOIN emp_profile AS ep ON em.emp_profile_id = ep.emp_profile_id
                LEFT JOIN organization AS org ON em.emp_org_id = org.org_id
            "#,
            self.table
        );

        FilteredQuery::new(head)
            .filter("sk.periode = ?", filter.periode.clone())
            .filter_opt("sk.nipam = ?", filter.nipam.clone())
            .filter_opt(
                "ep.emp_name LIKE ? ESCAPE '!'",
                filter.nama.as_deref().map(like_contains),
            )
            .filter_opt("em.emp_org_id = ?", filter.org_id)
            .order_by("sk.nipam")
    }

    /// One page of the listing
    pub async fn fetch_page(
        &self,
        filter: &TunkinFilter,
        request: PageRequest,
    ) -> DatabaseResult<Page<TunkinRow>> {
        fetch_page(&self.pool, &self.list_query(filter), request).await
    }

    /// Whether any row exists for the period
    pub async fn exists(&self, periode: &str) -> DatabaseResult<bool> {
        let sql = format!(
            "SELECT CAST(EXISTS(SELECT 1 FROM {} WHERE periode = ?) AS SIGNED) AS is_exist",
            self.table
        );
        let found: i64 = sqlx::query_scalar(&sql)
            .bind(periode)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(found != 0)
    }

    fn upsert_statement<'a>(&self, batch: &'a [SalaryKpiRecord]) -> QueryBuilder<'a, MySql> {
        let mut builder =
            QueryBuilder::new(format!("INSERT INTO {} (periode, nipam, nominal) ", self.table));
        builder.push_values(batch, |mut row, record| {
            row.push_bind(record.periode.as_str())
                .push_bind(record.nipam.as_str())
                .push_bind(record.nominal);
        });
        builder.push(" ON DUPLICATE KEY UPDATE nominal = VALUES(nominal)");
        builder
    }

    /// Insert or overwrite every record in one transaction
    ///
    /// Returns the affected-row count reported by the server. Nothing is
    /// committed unless every batch succeeds.
    pub async fn upsert(&self, records: &[SalaryKpiRecord]) -> DatabaseResult<u64> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        let mut affected = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let result = self.upsert_statement(batch).build().execute(&mut *tx).await;
            match result {
                Ok(done) => affected += done.rows_affected(),
                Err(e) => {
                    error!("Upsert into {} failed, rolling back: {}", self.table, e);
                    if let Err(rollback) = tx.rollback().await {
                        error!("Rollback failed: {}", rollback);
                    }
                    return Err(DatabaseError::Query(e));
                }
            }
        }

        tx.commit().await.map_err(DatabaseError::Query)?;
        info!(
            "{} rows upserted into {}, {} affected",
            records.len(),
            self.table,
            affected
        );
        Ok(affected)
    }
}
