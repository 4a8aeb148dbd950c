//! Request context and access guard middleware
//!
//! Correlation ids and exchange logging come from tower-http
//! (`SetRequestIdLayer`, `TraceLayer`, `PropagateRequestIdLayer`); this
//! module only makes the id visible to response envelopes and keeps
//! framework-generated errors inside the envelope.

use std::{any::Any, sync::Arc};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tower_http::request_id::RequestId;
use tracing::{Span, info_span, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    response::{ApiResponse, REQUEST_ID},
    state::AppState,
};

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Span for `TraceLayer`, tagged with the correlation id
pub fn request_span(req: &Request) -> Span {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}

/// Run the rest of the stack inside the request's correlation scope
pub async fn request_context(req: Request, next: Next) -> Response {
    let request_id = request_id_of(&req);
    REQUEST_ID
        .scope(request_id, async move { envelope_bare_error(next.run(req).await) })
        .await
}

/// Wrap body-less error responses produced by the router itself, such as
/// 405, in the standard envelope
fn envelope_bare_error(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let (parts, _) = response.into_parts();
    let message = status.canonical_reason().unwrap_or("Request failed");
    let mut enveloped = ApiResponse::failure(status, message).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_LENGTH {
            enveloped
                .headers_mut()
                .entry(name)
                .or_insert_with(|| value.clone());
        }
    }
    enveloped
}

/// `CatchPanicLayer` handler: a panicking handler becomes a 500 envelope
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ApiError::Internal(format!("Handler panicked: {}", detail)).into_response()
}

/// What a guarded route requires of the caller
#[derive(Debug, Clone)]
pub enum AccessRule {
    /// At least one of these capability codes
    Capabilities(&'static [&'static str]),
    /// One of these role ids; empty allows every active user
    AnyRole(Arc<[i64]>),
}

/// Middleware state for [`require_access`]
#[derive(Clone)]
pub struct RoleGuard {
    pub state: AppState,
    pub rule: AccessRule,
}

impl RoleGuard {
    pub fn capabilities(state: &AppState, codes: &'static [&'static str]) -> Self {
        Self {
            state: state.clone(),
            rule: AccessRule::Capabilities(codes),
        }
    }

    pub fn any_role(state: &AppState, roles: &[i64]) -> Self {
        Self {
            state: state.clone(),
            rule: AccessRule::AnyRole(roles.into()),
        }
    }
}

/// Authenticate the bearer token and enforce the route's rule
///
/// On success the caller's `UserProfile` is placed in the request
/// extensions for handlers to pick up.
pub async fn require_access(
    State(guard): State<RoleGuard>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        warn!("Missing bearer token for {}", req.uri().path());
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };

    let authorizer = &guard.state.authorizer;
    let user = authorizer.current_user(bearer.token()).await?;

    match &guard.rule {
        AccessRule::Capabilities(codes) => authorizer.require_role(&user, codes).await?,
        AccessRule::AnyRole(roles) => authorizer.require_any_role(&user, roles)?,
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
