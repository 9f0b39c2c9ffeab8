//! Team handlers: creation, membership, settings, and permission flags.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teamgrid_core::models::{Team, TeamMemberProfile, TeamPermissions};
use teamgrid_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::HttpAppError;
use crate::middleware::{AuthUser, TeamMembership};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64))]
    pub team_name: String,
    #[validate(length(max = 255))]
    pub team_desc: Option<String>,
    #[validate(length(min = 4, max = 16))]
    pub team_code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinTeamRequest {
    pub team_code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteMemberRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 64))]
    pub team_name: Option<String>,
    #[validate(length(max = 255))]
    pub team_desc: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    pub allow_task: bool,
    pub allow_file: bool,
    pub allow_invite: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCodeRequest {
    #[validate(length(min = 4, max = 16))]
    pub team_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub team: Team,
    pub permissions: TeamPermissions,
}

#[tracing::instrument(skip(state, user, req))]
pub async fn create_team(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), HttpAppError> {
    req.validate().map_err(AppError::from)?;

    let team = state
        .teams
        .create_team(
            user.user_id,
            &req.team_name,
            req.team_desc.as_deref(),
            &req.team_code,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

#[tracing::instrument(skip(state, user))]
pub async fn list_my_teams(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Team>>, HttpAppError> {
    let teams = state.teams.list_teams_for_user(user.user_id).await?;
    Ok(Json(teams))
}

#[tracing::instrument(skip(state, user, req))]
pub async fn join_team(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinTeamRequest>,
) -> Result<Json<Team>, HttpAppError> {
    let team = state.teams.join_by_code(user.user_id, &req.team_code).await?;
    tracing::info!(user_id = %user.user_id, team_id = %team.team_id, "User joined team");
    Ok(Json(team))
}

#[tracing::instrument(skip(state, membership))]
pub async fn get_about(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Team>, HttpAppError> {
    let team = state
        .teams
        .get_team(membership.team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
    Ok(Json(team))
}

#[tracing::instrument(skip(state, membership))]
pub async fn get_members(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamMemberProfile>>, HttpAppError> {
    let members = state.teams.get_members(membership.team_id).await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(state, membership, req))]
pub async fn invite_member(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Json(req): Json<InviteMemberRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), HttpAppError> {
    req.validate().map_err(AppError::from)?;

    state
        .teams
        .add_member_by_email(membership.team_id, &req.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Member added" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct MemberPathParams {
    pub member_id: Uuid,
}

#[tracing::instrument(skip(state, membership))]
pub async fn remove_member(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Path(params): Path<MemberPathParams>,
) -> Result<StatusCode, HttpAppError> {
    state
        .teams
        .remove_member(membership.team_id, params.member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, user, membership))]
pub async fn exit_team(
    user: AuthUser,
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    state.teams.exit_team(user.user_id, membership.team_id).await?;
    Ok(Json(serde_json::json!({ "message": "Left team" })))
}

#[tracing::instrument(skip(state, membership))]
pub async fn get_settings(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsResponse>, HttpAppError> {
    let team = state
        .teams
        .get_team(membership.team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
    let permissions = state.teams.get_permissions(membership.team_id).await?;

    Ok(Json(SettingsResponse { team, permissions }))
}

#[tracing::instrument(skip(state, membership, req))]
pub async fn update_team(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<Team>, HttpAppError> {
    req.validate().map_err(AppError::from)?;

    let team = state
        .teams
        .update_team(
            membership.team_id,
            req.team_name.as_deref(),
            req.team_desc.as_deref(),
        )
        .await?;
    Ok(Json(team))
}

/// Only the owner ever reaches this; the flags themselves gate members only.
#[tracing::instrument(skip(state, membership, req))]
pub async fn update_permissions(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePermissionsRequest>,
) -> Result<Json<TeamPermissions>, HttpAppError> {
    let permissions = state
        .teams
        .update_permissions(
            membership.team_id,
            req.allow_task,
            req.allow_file,
            req.allow_invite,
        )
        .await?;
    Ok(Json(permissions))
}

#[tracing::instrument(skip(state, membership, req))]
pub async fn update_code(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCodeRequest>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    req.validate().map_err(AppError::from)?;

    state
        .teams
        .update_code(membership.team_id, &req.team_code)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Team code updated" })))
}

#[tracing::instrument(skip(state, membership))]
pub async fn delete_team(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HttpAppError> {
    state.teams.delete_team(membership.team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
