//! User account handlers: registration, login, token refresh, logout,
//! profile.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teamgrid_core::models::User;
use teamgrid_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{password, TokenType};
use crate::error::HttpAppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HttpAppError> {
    req.validate().map_err(AppError::from)?;

    let password_hash = password::hash_password(&req.password)?;
    let user = state
        .users
        .create_user(&req.username, &req.email, &password_hash)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()).into());
    }

    let access_token = state.auth.tokens.sign_access(user.user_id)?;
    let refresh_token = state.auth.tokens.sign_refresh(user.user_id)?;
    let expires_at = chrono::Utc::now() + state.auth.tokens.refresh_expiry();

    state
        .sessions
        .create_session(user.user_id, &access_token, &refresh_token, expires_at)
        .await?;

    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok(Json(LoginResponse {
        user: user.into(),
        access_token,
        refresh_token,
    }))
}

#[tracing::instrument(skip(state, req))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, HttpAppError> {
    let claims = state.auth.tokens.parse(&req.refresh_token, TokenType::Refresh)?;

    let session = state
        .sessions
        .find_by_refresh_token(&req.refresh_token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session no longer active".to_string()))?;

    if session.user_id != claims.sub {
        return Err(AppError::Unauthorized("Session no longer active".to_string()).into());
    }

    let access_token = state.auth.tokens.sign_access(session.user_id)?;
    let refresh_token = state.auth.tokens.sign_refresh(session.user_id)?;
    let expires_at = chrono::Utc::now() + state.auth.tokens.refresh_expiry();

    state
        .sessions
        .rotate_tokens(session.session_id, &access_token, &refresh_token, expires_at)
        .await?;

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

#[tracing::instrument(skip(state, user))]
pub async fn logout(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    let removed = state
        .sessions
        .delete_session(user.user_id, &user.access_token)
        .await?;

    if !removed {
        return Err(AppError::Unauthorized("Session no longer active".to_string()).into());
    }

    tracing::info!(user_id = %user.user_id, "User logged out");
    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

/// Profile of the calling user. The params-check middleware guarantees the
/// path `user_id` is the caller's own.
#[tracing::instrument(skip(state))]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, HttpAppError> {
    let user = state
        .users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
