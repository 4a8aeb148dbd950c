//! Token issuance, refresh, validation and the current-user profile

use axum::{
    Extension, Form, Json,
    extract::{Query, State, rejection::QueryRejection},
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    jwt::TokenType,
    models::{
        AccessTokenResponse, RefreshTokenRequest, TokenPairResponse, TokenRequest,
        TokenValidation, UserProfile, ValidateTokenQuery,
    },
    response::ApiResponse,
    state::AppState,
    validation::validate_credentials,
};

const TOKEN_TYPE: &str = "bearer";

/// OAuth2 password grant
pub async fn token(
    State(state): State<AppState>,
    WithRejection(Form(form), _): WithRejection<Form<TokenRequest>, ApiError>,
) -> ApiResult<ApiResponse<TokenPairResponse>> {
    if !state
        .jwt_service
        .validate_client(form.client_id.as_deref(), form.client_secret.as_deref())
    {
        warn!("Token request with invalid client credentials");
        return Err(ApiError::Unauthorized(
            "Invalid client credentials".to_string(),
        ));
    }

    if let Some(grant_type) = form.grant_type.as_deref().filter(|g| *g != "password") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported grant type '{}'",
            grant_type
        )));
    }

    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    validate_credentials(&username, &password).map_err(ApiError::BadRequest)?;

    let user = state
        .user_repository
        .authenticate(&username, &password)
        .await?;

    if user.disabled {
        warn!("Login refused for inactive user: {}", user.username);
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let access_token = state.jwt_service.create_access_token(&user, None)?;
    let refresh_token = state.jwt_service.create_refresh_token(&user, None)?;
    info!("Issued token pair for user: {}", user.username);

    Ok(ApiResponse::created(TokenPairResponse {
        access_token,
        refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshTokenRequest>, ApiError>,
) -> ApiResult<ApiResponse<AccessTokenResponse>> {
    let claims = state.jwt_service.decode_token(&payload.token)?;

    if claims.token_type != TokenType::Refresh {
        warn!("Refresh attempted with {}", claims.token_type.as_str());
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let user = state
        .user_repository
        .find_by_username(&claims.sub)
        .await?
        .filter(|user| !user.disabled)
        .ok_or_else(|| {
            warn!("Refresh for unknown or inactive user: {}", claims.sub);
            ApiError::Unauthorized("Invalid refresh token".to_string())
        })?;

    let access_token = state.jwt_service.create_access_token(&user, None)?;

    Ok(ApiResponse::ok(AccessTokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// Report whether a token is currently valid; never fails
pub async fn validate(
    State(state): State<AppState>,
    query: Result<Query<ValidateTokenQuery>, QueryRejection>,
) -> ApiResponse<TokenValidation> {
    let Ok(Query(query)) = query else {
        return ApiResponse::ok(TokenValidation::invalid("Token is required"));
    };

    let validation = match state.jwt_service.decode_token(&query.token) {
        Ok(claims) => TokenValidation {
            valid: true,
            username: Some(claims.sub),
            role: claims.role,
            expires_at: Some(claims.exp),
            token_type: Some(claims.token_type.as_str().to_string()),
            error: None,
        },
        Err(e) => TokenValidation::invalid(&e.to_string()),
    };

    ApiResponse::ok(validation)
}

/// Profile of the authenticated caller
pub async fn me(Extension(user): Extension<UserProfile>) -> ApiResponse<UserProfile> {
    ApiResponse::ok(user)
}
