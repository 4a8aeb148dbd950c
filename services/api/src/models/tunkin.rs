//! Salary KPI (tunkin) models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ingested row, keyed by (periode, nipam)
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryKpiRecord {
    pub periode: String,
    pub nipam: String,
    pub nominal: f64,
}

/// Query parameters for the paginated listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TunkinQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Exact employee code
    pub nipam: Option<String>,
    /// Substring of the employee name
    pub nama: Option<String>,
    /// Obfuscated organization id
    #[serde(rename = "orgId")]
    pub org_id: Option<String>,
}

/// Row shape of the listing query
#[derive(Debug, Clone, FromRow)]
pub struct TunkinRow {
    pub periode: String,
    pub nipam: String,
    pub nama: Option<String>,
    pub org_id: Option<i64>,
    pub org_name: Option<String>,
    pub nominal: Option<f64>,
}

/// Listing item with the organization id obfuscated
#[derive(Debug, Clone, Serialize)]
pub struct TunkinItem {
    pub periode: String,
    pub nipam: String,
    pub nama: Option<String>,
    pub org_id: Option<String>,
    pub org_name: Option<String>,
    pub nominal: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ExistResponse {
    pub is_exist: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub status: String,
    pub affected_rows: u64,
}
