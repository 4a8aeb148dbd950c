//! API service routes

pub mod auth;
pub mod organization;
pub mod tunkin;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::ApiError,
    middleware::{RoleGuard, panic_response, request_context, request_span, require_access},
    response::ApiResponse,
    state::AppState,
};

/// Capability required by the payroll processing endpoints
pub const PAYROLL_PROCESS: &[&str] = &["payrollprocess"];

/// Room for multipart boundaries and the non-file fields
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state
        .config
        .upload
        .max_size_bytes
        .saturating_add(MULTIPART_OVERHEAD);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let payroll_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/tunkin/:periode", get(tunkin::list))
        .route("/tunkin/exists/:periode", get(tunkin::exists))
        .route(
            "/tunkin/upload",
            post(tunkin::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/tunkin/download/template", get(tunkin::download_template))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::capabilities(&state, PAYROLL_PROCESS),
            require_access,
        ));

    let organization_routes = Router::new()
        .route("/organization/list", get(organization::list))
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::any_role(&state, &state.config.authorization.organization_roles),
            require_access,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/token", post(auth::token))
        .route("/refresh", post(auth::refresh))
        .route("/validate", get(auth::validate).options(auth::validate))
        .merge(payroll_routes)
        .merge(organization_routes)
        .fallback(not_found)
        // The last layer runs first, so the id exists before tracing and the scope
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_context))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<Value> {
    let database = matches!(
        common::database::health_check(&state.db_pool).await,
        Ok(true)
    );

    ApiResponse::ok(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "payroll-api",
        "database": database,
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}
