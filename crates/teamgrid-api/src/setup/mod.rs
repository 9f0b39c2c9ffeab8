//! Application setup and initialization
//!
//! All application initialization logic lives here rather than in main.rs.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use std::sync::Arc;
use teamgrid_core::Config;
use teamgrid_db::{
    FileRepository, MembershipRepository, SessionRepository, TaskRepository, TeamRepository,
    UserRepository,
};

use crate::auth::TokenFactory;
use crate::middleware::{AuthState, TeamAuthState};
use crate::services::authorization::AuthorizationService;
use crate::services::upload::UploadService;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let storage = teamgrid_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage initialized");

    let sessions = SessionRepository::new(pool.clone());
    let memberships = MembershipRepository::new(pool.clone());

    let tokens = TokenFactory::new(
        &config.jwt_secret,
        config.jwt_access_expiry_hours,
        config.jwt_refresh_expiry_hours,
    );
    let auth = Arc::new(AuthState {
        tokens,
        sessions: Arc::new(sessions.clone()),
    });
    let team_auth = Arc::new(TeamAuthState {
        authz: AuthorizationService::new(
            Arc::new(memberships.clone()),
            Arc::new(memberships),
        ),
    });

    let upload = UploadService::from_config(&config, storage.clone());

    let state = Arc::new(AppState {
        users: UserRepository::new(pool.clone()),
        sessions,
        teams: TeamRepository::new(pool.clone()),
        tasks: TaskRepository::new(pool.clone()),
        files: FileRepository::new(pool.clone()),
        storage,
        upload,
        auth,
        team_auth,
        config,
        pool,
    });

    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}
