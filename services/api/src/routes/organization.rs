//! Organization lookup

use axum::extract::State;

use crate::{
    error::{ApiError, ApiResult},
    models::Organization,
    response::ApiResponse,
    state::AppState,
};

/// Enabled organizations with obfuscated ids; 404 when there are none
pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Organization>>> {
    let rows = state.organization_repository.fetch_all().await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("No organizations found".to_string()));
    }

    let organizations = rows
        .into_iter()
        .map(|row| {
            Ok(Organization {
                org_id: state.ids.encode_i64(row.org_id)?,
                org_name: row.org_name,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(ApiResponse::ok(organizations))
}
