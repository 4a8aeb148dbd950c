//! Service configuration
//!
//! Values come from an optional `config/payroll.*` file overlaid with
//! environment variables prefixed `APP_`, using `__` between sections:
//!
//! - `APP_SERVER__LISTEN` (default `0.0.0.0:8000`)
//! - `APP_DATABASE__URL`, `APP_DATABASE__MAX_CONNECTIONS`, `APP_DATABASE__MIN_CONNECTIONS`,
//!   `APP_DATABASE__ACQUIRE_TIMEOUT_SECS`
//! - `APP_JWT__SECRET_KEY`, `APP_JWT__ALGORITHM`, `APP_JWT__ACCESS_TOKEN_EXPIRE_MINUTES`,
//!   `APP_JWT__REFRESH_TOKEN_EXPIRE_DAYS`, `APP_JWT__CLIENT_ID`, `APP_JWT__CLIENT_SECRET`
//! - `APP_SQIDS__ALPHABET`, `APP_SQIDS__MIN_LENGTH`
//! - `APP_UPLOAD__TABLE`, `APP_UPLOAD__MAX_SIZE_BYTES`, `APP_UPLOAD__TEMPLATE_PATH`
//! - `APP_AUTHORIZATION__ORGANIZATION_ROLES` (comma separated role ids)

use std::path::PathBuf;

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{jwt::JwtConfig, validation};

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Opaque identifier settings
#[derive(Debug, Clone, Deserialize)]
pub struct SqidsConfig {
    pub alphabet: String,
    pub min_length: u8,
}

/// Spreadsheet ingestion settings
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Target table for the salary KPI upsert
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
}

fn default_table() -> String {
    "salary_kpi".to_string()
}

fn default_max_size() -> u64 {
    50 * 1024 * 1024
}

fn default_template_path() -> PathBuf {
    PathBuf::from("template/template.xlsx")
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            max_size_bytes: default_max_size(),
            template_path: default_template_path(),
        }
    }
}

/// Role allow-lists for endpoints guarded by role id instead of capability
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationConfig {
    /// Empty means any authenticated, active user
    #[serde(default)]
    pub organization_roles: Vec<i64>,
}

/// Complete service configuration, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub sqids: SqidsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

impl AppConfig {
    /// Load from `config/payroll.*` (optional) and `APP_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(File::with_name("config/payroll").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("authorization.organization_roles"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_identifier(&self.upload.table)
            .map_err(|e| ConfigError::Message(format!("upload.table: {}", e)))?;

        if self.upload.max_size_bytes == 0 {
            return Err(ConfigError::Message(
                "upload.max_size_bytes must be greater than zero".to_string(),
            ));
        }

        self.jwt
            .algorithm()
            .map_err(|e| ConfigError::Message(format!("jwt.algorithm: {}", e)))?;

        if self.jwt.secret_key.is_empty() {
            return Err(ConfigError::Message("jwt.secret_key must be set".to_string()));
        }

        Ok(())
    }
}
