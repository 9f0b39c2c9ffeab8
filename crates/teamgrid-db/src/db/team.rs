use sqlx::PgPool;
use teamgrid_core::models::{Team, TeamMemberProfile, TeamPermissions, TeamRole};
use teamgrid_core::AppError;
use uuid::Uuid;

use super::user::is_unique_violation;

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a team with its owner membership and default permission flags
    /// in one transaction. Every team always has a permission row; the
    /// capability lookup treats a missing row as deny.
    pub async fn create_team(
        &self,
        owner_id: Uuid,
        team_name: &str,
        team_desc: Option<&str>,
        team_code: &str,
    ) -> Result<Team, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (team_name, team_desc, team_code)
            VALUES ($1, $2, $3)
            RETURNING team_id, team_name, team_desc, team_code, created_at, updated_at
            "#,
        )
        .bind(team_name)
        .bind(team_desc)
        .bind(team_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidInput("Team code has been used".to_string())
            } else {
                tracing::error!(error = %e, "Failed to insert team");
                AppError::Database(e)
            }
        })?;

        sqlx::query(r#"INSERT INTO team_permissions (team_id) VALUES ($1)"#)
            .bind(team.team_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, 'OWNER')
            "#,
        )
        .bind(team.team_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(team_id = %team.team_id, owner_id = %owner_id, "Created new team");
        Ok(team)
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT team_id, team_name, team_desc, team_code, created_at, updated_at
            FROM teams
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(team)
    }

    /// Teams the user belongs to, newest first.
    pub async fn list_teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>, AppError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.team_id, t.team_name, t.team_desc, t.team_code, t.created_at, t.updated_at
            FROM teams t
            JOIN team_members m ON m.team_id = t.team_id
            WHERE m.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(teams)
    }

    pub async fn get_members(&self, team_id: Uuid) -> Result<Vec<TeamMemberProfile>, AppError> {
        let members = sqlx::query_as::<_, TeamMemberProfile>(
            r#"
            SELECT u.user_id, u.username, u.email, m.role, m.joined_at
            FROM team_members m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(members)
    }

    /// Join a team by its code. Returns the joined team.
    pub async fn join_by_code(&self, user_id: Uuid, team_code: &str) -> Result<Team, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT team_id, team_name, team_desc, team_code, created_at, updated_at
            FROM teams
            WHERE team_code = $1
            "#,
        )
        .bind(team_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Team code not found".to_string()))?;

        self.insert_member(team.team_id, user_id).await?;
        Ok(team)
    }

    /// Add a member by email (invite flow).
    pub async fn add_member_by_email(&self, team_id: Uuid, email: &str) -> Result<(), AppError> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT user_id FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("User with this email not found".to_string()))?;

        self.insert_member(team_id, user_id).await
    }

    async fn insert_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, 'MEMBER')
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidInput("User is already a member of this team".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    /// Remove a member. Owners cannot be removed this way; deleting the team
    /// is the only path that removes an owner.
    pub async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM team_members
            WHERE team_id = $1 AND user_id = $2 AND role <> 'OWNER'
            "#,
        )
        .bind(team_id)
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found in team".to_string()));
        }
        Ok(())
    }

    pub async fn get_permissions(&self, team_id: Uuid) -> Result<TeamPermissions, AppError> {
        let permissions = sqlx::query_as::<_, TeamPermissions>(
            r#"
            SELECT team_id, allow_task, allow_file, allow_invite
            FROM team_permissions
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Team permissions not found".to_string()))?;

        Ok(permissions)
    }

    pub async fn update_permissions(
        &self,
        team_id: Uuid,
        allow_task: bool,
        allow_file: bool,
        allow_invite: bool,
    ) -> Result<TeamPermissions, AppError> {
        let permissions = sqlx::query_as::<_, TeamPermissions>(
            r#"
            UPDATE team_permissions
            SET allow_task = $2, allow_file = $3, allow_invite = $4
            WHERE team_id = $1
            RETURNING team_id, allow_task, allow_file, allow_invite
            "#,
        )
        .bind(team_id)
        .bind(allow_task)
        .bind(allow_file)
        .bind(allow_invite)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("Team permissions not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(permissions)
    }

    pub async fn update_team(
        &self,
        team_id: Uuid,
        team_name: Option<&str>,
        team_desc: Option<&str>,
    ) -> Result<Team, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET team_name = COALESCE($2, team_name),
                team_desc = COALESCE($3, team_desc),
                updated_at = NOW()
            WHERE team_id = $1
            RETURNING team_id, team_name, team_desc, team_code, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(team_name)
        .bind(team_desc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("Team not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(team)
    }

    /// Rotate the join code.
    pub async fn update_code(&self, team_id: Uuid, team_code: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE teams SET team_code = $2, updated_at = NOW() WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .bind(team_code)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidInput("Team code has been used".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    /// Delete a team; memberships, permissions, tasks and file rows cascade.
    pub async fn delete_team(&self, team_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM teams WHERE team_id = $1"#)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        tracing::info!(team_id = %team_id, "Deleted team");
        Ok(())
    }

    /// Leave a team. The owner cannot leave their own team.
    pub async fn exit_team(&self, user_id: Uuid, team_id: Uuid) -> Result<(), AppError> {
        let role = sqlx::query_scalar::<_, TeamRole>(
            r#"SELECT role FROM team_members WHERE team_id = $1 AND user_id = $2"#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Member not found in team".to_string()))?;

        if role == TeamRole::Owner {
            return Err(AppError::InvalidInput(
                "Owner cannot exit the team; delete the team instead".to_string(),
            ));
        }

        sqlx::query(r#"DELETE FROM team_members WHERE team_id = $1 AND user_id = $2"#)
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
