//! Application state for dependency injection.

use sqlx::PgPool;
use std::sync::Arc;
use teamgrid_core::Config;
use teamgrid_db::{
    FileRepository, SessionRepository, TaskRepository, TeamRepository, UserRepository,
};
use teamgrid_storage::Storage;

use crate::middleware::{AuthState, TeamAuthState};
use crate::services::upload::UploadService;

/// Main application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,

    // Repositories
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub teams: TeamRepository,
    pub tasks: TaskRepository,
    pub files: FileRepository,

    // Services
    pub storage: Arc<dyn Storage>,
    pub upload: UploadService,

    // Middleware states
    pub auth: Arc<AuthState>,
    pub team_auth: Arc<TeamAuthState>,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
