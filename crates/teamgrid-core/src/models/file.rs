use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Persisted file attachment row for a team.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamFile {
    pub file_id: Uuid,
    pub team_id: Uuid,
    /// Uploader.
    pub user_id: Uuid,
    /// Generated storage name, not the name the client sent.
    pub file_name: String,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

/// File list row joined with the uploader's username.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamFileWithUploader {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one successfully transferred upload job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    pub file_name: String,
    pub url: String,
}
