//! User repository for database operations

use std::sync::Arc;

use common::{
    error::{DatabaseError, DatabaseResult},
    ids::IdObfuscator,
};
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::{UserRecord, UserRow},
};

const INCORRECT_CREDENTIALS: &str = "Incorrect username or password";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: MySqlPool,
    ids: Arc<IdObfuscator>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: MySqlPool, ids: Arc<IdObfuscator>) -> Self {
        Self { pool, ids }
    }

    /// Find a user by login name, with the role id obfuscated
    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                su.user_login AS username,
                ep.emp_name AS full_name,
                ep.emp_email AS email,
                CAST(IF(em.emp_status = 1, 0, 1) AS SIGNED) AS disabled,
                CAST(su.user_role_id AS SIGNED) AS role,
                su.user_password AS user_password
            FROM
                sys_user AS su
                INNER JOIN employee AS em ON su.user_emp_id = em.emp_id
                INNER JOIN emp_profile AS ep ON em.emp_profile_id = ep.emp_profile_id
            WHERE
                su.user_login = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.map(|row| self.to_record(row)).transpose()
    }

    fn to_record(&self, row: UserRow) -> ApiResult<UserRecord> {
        let role = match row.role {
            Some(role) => self.ids.encode_i64(role)?,
            None => String::new(),
        };

        Ok(UserRecord {
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            disabled: row.disabled != 0,
            role,
            password_hash: row.user_password,
        })
    }

    /// Hash a plaintext password with the database's one-way function
    async fn hash_password(&self, password: &str) -> DatabaseResult<Option<String>> {
        sqlx::query_scalar::<_, Option<String>>("SELECT PASSWORD(?)")
            .bind(password)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Verify credentials
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<UserRecord> {
        info!("Login attempt for user: {}", username);

        let Some(user) = self.find_by_username(username).await? else {
            warn!("Login rejected for user: {}", username);
            return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS.to_string()));
        };

        let supplied = self.hash_password(password).await?;
        let matches = match (&supplied, &user.password_hash) {
            (Some(supplied), Some(stored)) => supplied == stored,
            _ => false,
        };

        if !matches {
            warn!("Login rejected for user: {}", username);
            return Err(ApiError::Unauthorized(INCORRECT_CREDENTIALS.to_string()));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, lazy_pool};

    const ALPHABET: &str = "k3G7QAe51FCsPW92uEOyq4Bg6Sp8YzVTmnU0liwDdHXLajZrfxNhobJIRcMvKt";

    fn repository() -> UserRepository {
        let mut config = DatabaseConfig::new("mysql://root@127.0.0.1:1/payroll");
        config.min_connections = 0;
        let ids = Arc::new(IdObfuscator::new(ALPHABET, 10).unwrap());
        UserRepository::new(lazy_pool(&config).unwrap(), ids)
    }

    #[tokio::test]
    async fn test_row_conversion_obfuscates_role() {
        let repository = repository();
        let record = repository
            .to_record(UserRow {
                username: "budi".to_string(),
                full_name: Some("Budi".to_string()),
                email: None,
                disabled: 0,
                role: Some(3),
                user_password: Some("*HASH".to_string()),
            })
            .unwrap();

        assert!(!record.disabled);
        assert_ne!(record.role, "3");
        assert_eq!(repository.ids.decode_i64(&record.role).unwrap(), 3);
        assert!(record.profile().role == record.role);
    }

    #[tokio::test]
    async fn test_row_conversion_without_role() {
        let record = repository()
            .to_record(UserRow {
                username: "siti".to_string(),
                full_name: None,
                email: None,
                disabled: 1,
                role: None,
                user_password: None,
            })
            .unwrap();

        assert!(record.disabled);
        assert_eq!(record.role, "");
    }
}
