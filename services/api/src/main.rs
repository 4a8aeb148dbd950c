use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod authorization;
mod config;
mod error;
mod ingest;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod response;
mod routes;
mod state;
mod validation;

use common::{
    database::{health_check, init_pool},
    ids::IdObfuscator,
};
use tokio::net::TcpListener;

use crate::{config::AppConfig, jwt::JwtService, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting payroll API service");

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let ids = IdObfuscator::new(&config.sqids.alphabet, config.sqids.min_length)?;
    let jwt_service = JwtService::new(config.jwt.clone())?;
    let listen = config.server.listen.clone();

    let app_state = AppState::new(config, pool, jwt_service, ids);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Payroll API service listening on {}", listen);

    axum::serve(listener, app).await?;

    Ok(())
}
