//! Salary KPI (tunkin) listing, existence check, upload and template download

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use common::{ids::IdObfuscator, pagination::{Page, PageRequest}};
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    ingest::{IngestError, UploadedFile, prepare_records, validate_upload},
    models::{ExistResponse, TunkinItem, TunkinQuery, TunkinRow, UploadResult},
    repositories::TunkinFilter,
    response::ApiResponse,
    state::AppState,
    validation::validate_period,
};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;

const TEMPLATE_FILENAME: &str = "template_tunkin.xlsx";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn checked_period(periode: &str) -> ApiResult<()> {
    validate_period(periode).map_err(ApiError::BadRequest)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_item(ids: &IdObfuscator, row: TunkinRow) -> ApiResult<TunkinItem> {
    Ok(TunkinItem {
        org_id: row.org_id.map(|id| ids.encode_i64(id)).transpose()?,
        periode: row.periode,
        nipam: row.nipam,
        nama: row.nama,
        org_name: row.org_name,
        nominal: row.nominal,
    })
}

/// Paginated listing for one period
pub async fn list(
    State(state): State<AppState>,
    WithRejection(Path(periode), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<TunkinQuery>, ApiError>,
) -> ApiResult<ApiResponse<Page<TunkinItem>>> {
    checked_period(&periode)?;

    let request = PageRequest::new(
        query.page.unwrap_or(DEFAULT_PAGE),
        query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .ok_or_else(|| ApiError::BadRequest("page and size must be at least 1".to_string()))?;

    let org_id = non_blank(query.org_id)
        .map(|id| state.ids.decode_i64(&id))
        .transpose()?;

    let filter = TunkinFilter {
        periode,
        nipam: non_blank(query.nipam),
        nama: non_blank(query.nama),
        org_id,
    };

    let page = state
        .tunkin_repository
        .fetch_page(&filter, request)
        .await?
        .try_map(|row| to_item(&state.ids, row))?;

    Ok(ApiResponse::ok(page))
}

/// Whether the period already holds data
pub async fn exists(
    State(state): State<AppState>,
    WithRejection(Path(periode), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<ApiResponse<ExistResponse>> {
    checked_period(&periode)?;
    let is_exist = state.tunkin_repository.exists(&periode).await?;
    Ok(ApiResponse::ok(ExistResponse { is_exist }))
}

/// Ingest a workbook for the declared period
///
/// Expects multipart fields `file` and `periode`.
pub async fn upload(
    State(state): State<AppState>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<UploadResult>> {
    let mut file = None;
    let mut periode = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some(UploadedFile::new(filename, content_type, bytes));
            }
            Some("periode") => periode = Some(field.text().await?),
            _ => {}
        }
    }

    validate_upload(file.as_ref(), state.config.upload.max_size_bytes)?;
    let Some(file) = file else {
        return Err(IngestError::MissingFile.into());
    };

    let periode = non_blank(periode)
        .ok_or_else(|| ApiError::BadRequest("Periode is required".to_string()))?;
    checked_period(&periode)?;

    info!(
        filename = file.filename.as_deref().unwrap_or_default(),
        size = file.size(),
        periode = %periode,
        "Processing upload"
    );

    let declared = periode.clone();
    let records = tokio::task::spawn_blocking(move || prepare_records(file, &declared))
        .await
        .map_err(|e| {
            error!("Workbook parser task failed: {}", e);
            ApiError::Internal(e.to_string())
        })??;

    let affected_rows = state.tunkin_repository.upsert(&records).await?;

    Ok(ApiResponse::ok_with_message(
        UploadResult {
            status: "success".to_string(),
            affected_rows,
        },
        "File uploaded successfully",
    ))
}

/// The blank workbook users fill in before uploading
pub async fn download_template(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let path = &state.config.upload.template_path;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound("Template file not found".to_string())
        } else {
            ApiError::Internal(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILENAME),
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &str = "k3G7QAe51FCsPW92uEOyq4Bg6Sp8YzVTmnU0liwDdHXLajZrfxNhobJIRcMvKt";

    #[test]
    fn test_blank_filters_are_dropped() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" 1980 ".to_string())), Some("1980".to_string()));
    }

    #[test]
    fn test_rows_expose_obfuscated_org_id() {
        let ids = IdObfuscator::new(ALPHABET, 10).unwrap();
        let item = to_item(
            &ids,
            TunkinRow {
                periode: "202401".to_string(),
                nipam: "19800101".to_string(),
                nama: Some("Budi".to_string()),
                org_id: Some(42),
                org_name: Some("Keuangan".to_string()),
                nominal: Some(1_500_000.0),
            },
        )
        .unwrap();

        let org_id = item.org_id.unwrap();
        assert_ne!(org_id, "42");
        assert_eq!(ids.decode_i64(&org_id).unwrap(), 42);
        assert_eq!(item.nipam, "19800101");
    }

    #[test]
    fn test_row_without_organization() {
        let ids = IdObfuscator::new(ALPHABET, 10).unwrap();
        let item = to_item(
            &ids,
            TunkinRow {
                periode: "202401".to_string(),
                nipam: "19800102".to_string(),
                nama: None,
                org_id: None,
                org_name: None,
                nominal: None,
            },
        )
        .unwrap();
        assert!(item.org_id.is_none());
    }

    #[test]
    fn test_period_check_is_bad_request() {
        assert!(checked_period("202401").is_ok());
        assert!(matches!(checked_period("2024-01"), Err(ApiError::BadRequest(_))));
    }
}
