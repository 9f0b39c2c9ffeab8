//! Route configuration.
//!
//! The middleware chain is strictly ordered: `jwt_auth` wraps every
//! protected route, `team_auth` wraps every team-scoped route, and the
//! capability/owner gates wrap only the operations they protect. A gate
//! rejection short-circuits; the handler never runs.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use teamgrid_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{files, health, tasks, teams, users};
use crate::middleware::{auth, team};
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>> {
    let cors = setup_cors(config)?;

    let task_gate = from_fn_with_state(state.team_auth.clone(), team::require_task);
    let file_gate = from_fn_with_state(state.team_auth.clone(), team::require_file);
    let invite_gate = from_fn_with_state(state.team_auth.clone(), team::require_invite);
    let owner_gate = from_fn(team::require_owner);

    // Routes below /team/{team_id}; membership is resolved once by
    // `team_auth`, the gates consult the stamped role.
    let team_router = Router::new()
        .route("/about", get(teams::get_about))
        .route("/member", get(teams::get_members))
        .route("/exit", post(teams::exit_team))
        .route("/task", get(tasks::list_tasks))
        .route("/file", get(files::list_files))
        .route(
            "/task",
            post(tasks::create_task).route_layer(task_gate.clone()),
        )
        .route(
            "/task/{task_id}",
            patch(tasks::update_task)
                .delete(tasks::delete_task)
                .route_layer(task_gate),
        )
        .route(
            "/file",
            post(files::upload_files).route_layer(file_gate.clone()),
        )
        .route(
            "/file/{file_id}",
            delete(files::delete_file).route_layer(file_gate),
        )
        .route(
            "/invite",
            post(teams::invite_member).route_layer(invite_gate),
        )
        .route(
            "/setting",
            get(teams::get_settings).route_layer(owner_gate.clone()),
        )
        .route(
            "/",
            patch(teams::update_team)
                .delete(teams::delete_team)
                .route_layer(owner_gate.clone()),
        )
        .route(
            "/permission",
            patch(teams::update_permissions).route_layer(owner_gate.clone()),
        )
        .route(
            "/code",
            patch(teams::update_code).route_layer(owner_gate.clone()),
        )
        .route(
            "/member/{member_id}",
            delete(teams::remove_member).route_layer(owner_gate),
        )
        .layer(from_fn_with_state(
            state.team_auth.clone(),
            team::team_auth,
        ));

    let protected_routes = Router::new()
        .route("/team", post(teams::create_team).get(teams::list_my_teams))
        .route("/team/join", post(teams::join_team))
        .route("/users/logout", post(users::logout))
        .route(
            "/users/{user_id}/profile",
            get(users::get_profile).route_layer(from_fn(auth::params_check)),
        )
        .nest("/team/{team_id}", team_router)
        .layer(from_fn_with_state(state.auth.clone(), auth::jwt_auth));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh", post(users::refresh));

    // A batch may carry several files; size the body limit well above the
    // per-file ceiling.
    let body_limit = config
        .max_file_size_bytes
        .saturating_mul(10)
        .max(10 * 1024 * 1024);

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}
