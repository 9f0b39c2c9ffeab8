//! Login session persistence. Tokens are only valid while their session row
//! exists, so deleting the row revokes them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use teamgrid_core::models::UserSession;
use teamgrid_core::AppError;
use uuid::Uuid;

use crate::stores::SessionStore;

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a session row for a freshly issued token pair.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSession, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            INSERT INTO user_sessions (user_id, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING session_id, user_id, access_token, refresh_token, created_at, expires_at
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user_id, "Failed to create session");
            AppError::Database(e)
        })?;

        Ok(session)
    }

    /// Find the session holding this refresh token, if any.
    pub async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<UserSession>, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            SELECT session_id, user_id, access_token, refresh_token, created_at, expires_at
            FROM user_sessions
            WHERE refresh_token = $1
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(session)
    }

    /// Replace the token pair on an existing session (refresh flow).
    pub async fn rotate_tokens(
        &self,
        session_id: Uuid,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSession, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            UPDATE user_sessions
            SET access_token = $2, refresh_token = $3, expires_at = $4
            WHERE session_id = $1
            RETURNING session_id, user_id, access_token, refresh_token, created_at, expires_at
            "#,
        )
        .bind(session_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::Unauthorized("Session no longer active".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(session)
    }

    /// Delete the caller's session (logout). Returns whether a row was removed.
    pub async fn delete_session(
        &self,
        user_id: Uuid,
        access_token: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE user_id = $1 AND access_token = $2
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_active_session(
        &self,
        user_id: Uuid,
        access_token: &str,
    ) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT (CASE WHEN COUNT(*) = 1 THEN TRUE ELSE FALSE END)
            FROM user_sessions
            WHERE user_id = $1 AND access_token = $2
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user_id, "Failed to look up session");
            AppError::Database(e)
        })?;

        Ok(found)
    }
}
