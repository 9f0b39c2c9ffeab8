use sqlx::PgPool;
use teamgrid_core::models::{TeamFile, TeamFileWithUploader, UploadedFile};
use teamgrid_core::AppError;
use uuid::Uuid;

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist one batch of uploaded files for a team. Rows are keyed by the
    /// generated filename, never by batch position — result order from the
    /// worker pool is completion order.
    pub async fn save_uploaded_files(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        uploaded: &[UploadedFile],
    ) -> Result<Vec<TeamFile>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut rows = Vec::with_capacity(uploaded.len());

        for file in uploaded {
            let row = sqlx::query_as::<_, TeamFile>(
                r#"
                INSERT INTO team_files (team_id, user_id, file_name, file_url)
                VALUES ($1, $2, $3, $4)
                RETURNING file_id, team_id, user_id, file_name, file_url, created_at
                "#,
            )
            .bind(team_id)
            .bind(user_id)
            .bind(&file.file_name)
            .bind(&file.url)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, team_id = %team_id, "Failed to insert file row");
                AppError::Database(e)
            })?;
            rows.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(rows)
    }

    /// Files of a team with uploader usernames.
    pub async fn list_files(&self, team_id: Uuid) -> Result<Vec<TeamFileWithUploader>, AppError> {
        let files = sqlx::query_as::<_, TeamFileWithUploader>(
            r#"
            SELECT f.file_id, f.file_name, f.file_url, u.username, f.created_at
            FROM team_files f
            JOIN users u ON u.user_id = f.user_id
            WHERE f.team_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(files)
    }

    pub async fn get_file(&self, team_id: Uuid, file_id: Uuid) -> Result<TeamFile, AppError> {
        let file = sqlx::query_as::<_, TeamFile>(
            r#"
            SELECT file_id, team_id, user_id, file_name, file_url, created_at
            FROM team_files
            WHERE team_id = $1 AND file_id = $2
            "#,
        )
        .bind(team_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        Ok(file)
    }

    pub async fn delete_file(&self, team_id: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM team_files WHERE team_id = $1 AND file_id = $2"#)
            .bind(team_id)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Ok(())
    }
}
