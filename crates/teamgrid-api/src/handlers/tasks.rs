//! Task handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use teamgrid_core::models::{Task, TaskStatus, TaskWithAssignee};
use teamgrid_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::HttpAppError;
use crate::middleware::TeamMembership;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 32))]
    pub task_name: String,
    #[validate(length(max = 255))]
    pub task_desc: Option<String>,
    pub task_status: String,
    pub task_deadline: Option<NaiveDate>,
    /// Assignee.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 32))]
    pub task_name: Option<String>,
    #[validate(length(max = 255))]
    pub task_desc: Option<String>,
    pub task_status: Option<String>,
    pub task_deadline: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
}

/// Status strings are validated at the boundary; nothing unparsed reaches
/// the repository.
fn parse_status(status: &str) -> Result<TaskStatus, AppError> {
    status.parse::<TaskStatus>().map_err(AppError::InvalidInput)
}

#[tracing::instrument(skip(state, membership, req))]
pub async fn create_task(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), HttpAppError> {
    req.validate().map_err(AppError::from)?;
    let status = parse_status(&req.task_status)?;

    let task = state
        .tasks
        .create_task(
            membership.team_id,
            req.user_id,
            &req.task_name,
            req.task_desc.as_deref(),
            status,
            req.task_deadline,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[tracing::instrument(skip(state, membership))]
pub async fn list_tasks(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskWithAssignee>>, HttpAppError> {
    let tasks = state.tasks.list_tasks(membership.team_id).await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct TaskPathParams {
    pub task_id: Uuid,
}

#[tracing::instrument(skip(state, membership, req))]
pub async fn update_task(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Path(params): Path<TaskPathParams>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, HttpAppError> {
    req.validate().map_err(AppError::from)?;
    let status = req.task_status.as_deref().map(parse_status).transpose()?;

    let task = state
        .tasks
        .update_task(
            membership.team_id,
            params.task_id,
            req.user_id,
            req.task_name.as_deref(),
            req.task_desc.as_deref(),
            status,
            req.task_deadline,
        )
        .await?;

    Ok(Json(task))
}

#[tracing::instrument(skip(state, membership))]
pub async fn delete_task(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Path(params): Path<TaskPathParams>,
) -> Result<StatusCode, HttpAppError> {
    state
        .tasks
        .delete_task(membership.team_id, params.task_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
