//! Request authentication and role based authorization
//!
//! Two guard variants exist side by side:
//!
//! - [`Authorizer::require_role`] resolves the role's capability codes from
//!   the `sys_role_menu` tables and requires at least one of the requested
//!   codes.
//! - [`Authorizer::require_any_role`] compares the role id against a static
//!   allow-list, for endpoints that are not mapped to capability codes.

use std::sync::Arc;

use common::ids::IdObfuscator;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    jwt::{JwtService, TokenType},
    models::UserProfile,
    repositories::{MenuRepository, UserRepository},
};

const CREDENTIALS_REJECTED: &str = "Could not validate credentials";
const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

/// Fails with `Forbidden` unless `granted` shares a code with `required`
pub fn ensure_capability<S: AsRef<str>>(granted: &[S], required: &[&str]) -> ApiResult<()> {
    let allowed = granted
        .iter()
        .any(|code| required.contains(&code.as_ref()));

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string()))
    }
}

/// Fails with `Forbidden` unless `role_id` is allowed; an empty list allows all
pub fn ensure_role(role_id: i64, allowed: &[i64]) -> ApiResult<()> {
    if allowed.is_empty() || allowed.contains(&role_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string()))
    }
}

fn ensure_active(user: &UserProfile) -> ApiResult<()> {
    if user.disabled {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Authorizer {
    jwt_service: JwtService,
    users: UserRepository,
    menus: MenuRepository,
    ids: Arc<IdObfuscator>,
}

impl Authorizer {
    pub fn new(
        jwt_service: JwtService,
        users: UserRepository,
        menus: MenuRepository,
        ids: Arc<IdObfuscator>,
    ) -> Self {
        Self {
            jwt_service,
            users,
            menus,
            ids,
        }
    }

    /// Resolve the live user behind an access token
    ///
    /// The user is re-read from the database so a disabled account is
    /// rejected even while its token is still valid.
    pub async fn current_user(&self, token: &str) -> ApiResult<UserProfile> {
        let claims = self.jwt_service.decode_token(token)?;

        if claims.token_type != TokenType::Access || claims.sub.is_empty() {
            warn!("Rejected {} used as access token", claims.token_type.as_str());
            return Err(ApiError::Unauthorized(CREDENTIALS_REJECTED.to_string()));
        }

        match self.users.find_by_username(&claims.sub).await? {
            Some(user) if !user.disabled => Ok(user.profile()),
            _ => {
                warn!("Token subject {} is unknown or disabled", claims.sub);
                Err(ApiError::Unauthorized(CREDENTIALS_REJECTED.to_string()))
            }
        }
    }

    fn role_id(&self, user: &UserProfile) -> ApiResult<i64> {
        self.ids.decode_i64(&user.role).map_err(|_| {
            warn!("User {} carries an undecodable role", user.username);
            ApiError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string())
        })
    }

    /// Capability guard backed by the role-menu tables
    pub async fn require_role(&self, user: &UserProfile, required: &[&str]) -> ApiResult<()> {
        ensure_active(user)?;
        let role_id = self.role_id(user)?;
        let granted = self.menus.fetch_menu_codes(role_id).await?;
        ensure_capability(&granted, required).inspect_err(|_| {
            warn!(
                "User {} (role {}) lacks any of {:?}",
                user.username, role_id, required
            );
        })
    }

    /// Role guard backed by a static allow-list
    pub fn require_any_role(&self, user: &UserProfile, allowed: &[i64]) -> ApiResult<()> {
        ensure_active(user)?;
        if allowed.is_empty() {
            return Ok(());
        }
        ensure_role(self.role_id(user)?, allowed)
    }
}
