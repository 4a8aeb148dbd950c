//! Role to menu (capability) lookups

use common::error::{DatabaseError, DatabaseResult};
use sqlx::MySqlPool;

#[derive(Clone)]
pub struct MenuRepository {
    pool: MySqlPool,
}

impl MenuRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Capability codes granted to a role; empty when the role has none
    pub async fn fetch_menu_codes(&self, role_id: i64) -> DatabaseResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT
                sm.menu_code
            FROM
                sys_role_menu AS srm
                INNER JOIN sys_role AS sr ON srm.role_id = sr.role_id
                INNER JOIN sys_menu AS sm ON srm.menu_id = sm.menu_id
            WHERE
                sr.role_id = ?
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
