//! Application state shared across handlers

use std::sync::Arc;

use common::ids::IdObfuscator;
use sqlx::MySqlPool;

use crate::{
    authorization::Authorizer,
    config::AppConfig,
    jwt::JwtService,
    repositories::{MenuRepository, OrganizationRepository, TunkinRepository, UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: MySqlPool,
    pub jwt_service: JwtService,
    pub ids: Arc<IdObfuscator>,
    pub user_repository: UserRepository,
    pub tunkin_repository: TunkinRepository,
    pub organization_repository: OrganizationRepository,
    pub authorizer: Authorizer,
}

impl AppState {
    /// Wire repositories and services around one pool
    pub fn new(
        config: AppConfig,
        db_pool: MySqlPool,
        jwt_service: JwtService,
        ids: IdObfuscator,
    ) -> Self {
        let ids = Arc::new(ids);
        let user_repository = UserRepository::new(db_pool.clone(), ids.clone());
        let authorizer = Authorizer::new(
            jwt_service.clone(),
            user_repository.clone(),
            MenuRepository::new(db_pool.clone()),
            ids.clone(),
        );

        Self {
            tunkin_repository: TunkinRepository::new(db_pool.clone(), config.upload.table.clone()),
            organization_repository: OrganizationRepository::new(db_pool.clone()),
            config: Arc::new(config),
            db_pool,
            jwt_service,
            ids,
            user_repository,
            authorizer,
        }
    }
}
