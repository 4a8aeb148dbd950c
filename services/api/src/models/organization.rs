//! Organization models

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub org_id: i64,
    pub org_name: String,
}

/// Organization as exposed by the API
#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    pub org_id: String,
    pub org_name: String,
}
