//! File attachment handlers: multipart upload through the worker pool,
//! listing, and deletion.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use teamgrid_core::models::{TeamFile, TeamFileWithUploader};
use teamgrid_core::AppError;
use teamgrid_storage::StorageError;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::{AuthUser, TeamMembership};
use crate::services::upload::{BufferedSource, UploadSource};
use crate::state::AppState;

/// Collect every `files` field of the multipart form into upload sources.
async fn extract_multipart_files(
    mut multipart: Multipart,
) -> Result<Vec<Arc<dyn UploadSource>>, AppError> {
    let mut sources: Vec<Arc<dyn UploadSource>> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name().unwrap_or_default() != "files" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field.content_type().map(|s| s.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        sources.push(Arc::new(BufferedSource::new(filename, content_type, data)));
    }

    if sources.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }

    Ok(sources)
}

/// Upload a batch of files for the team and persist the resulting rows.
/// All-or-nothing: a failed transfer aborts the batch and nothing is
/// persisted.
#[tracing::instrument(skip(state, user, membership, multipart))]
pub async fn upload_files(
    user: AuthUser,
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<TeamFile>>), HttpAppError> {
    let sources = extract_multipart_files(multipart).await?;

    // Files live under a per-team prefix in the bucket.
    let uploaded = state
        .upload
        .upload_files(sources, false, &membership.team_id.to_string())
        .await?;

    let rows = state
        .files
        .save_uploaded_files(membership.team_id, user.user_id, &uploaded)
        .await?;

    Ok((StatusCode::CREATED, Json(rows)))
}

#[tracing::instrument(skip(state, membership))]
pub async fn list_files(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamFileWithUploader>>, HttpAppError> {
    let files = state.files.list_files(membership.team_id).await?;
    Ok(Json(files))
}

#[derive(Debug, Deserialize)]
pub struct FilePathParams {
    pub file_id: Uuid,
}

/// Delete a file row and its blob. A blob already missing from storage does
/// not block removing the row.
#[tracing::instrument(skip(state, membership))]
pub async fn delete_file(
    membership: TeamMembership,
    State(state): State<Arc<AppState>>,
    Path(params): Path<FilePathParams>,
) -> Result<StatusCode, HttpAppError> {
    let file = state
        .files
        .get_file(membership.team_id, params.file_id)
        .await?;

    let key = format!("{}/{}", membership.team_id, file.file_name);
    match state.storage.delete(&key).await {
        Ok(()) => {}
        Err(StorageError::NotFound(_)) => {
            tracing::warn!(key = %key, "Blob already missing while deleting file");
        }
        Err(e) => return Err(e.into()),
    }

    state
        .files
        .delete_file(membership.team_id, params.file_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
