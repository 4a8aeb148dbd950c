//! Organization repository

use common::error::{DatabaseError, DatabaseResult};
use sqlx::MySqlPool;

use crate::models::OrganizationRow;

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: MySqlPool,
}

impl OrganizationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// All enabled organizations
    pub async fn fetch_all(&self) -> DatabaseResult<Vec<OrganizationRow>> {
        sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT
                CAST(org_id AS SIGNED) AS org_id,
                org_name
            FROM organization
            WHERE org_status = ?
            ORDER BY org_name
            "#,
        )
        .bind("Enabled")
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
