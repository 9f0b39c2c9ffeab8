//! Membership and permission-flag lookups backing the authorization layer.

use async_trait::async_trait;
use sqlx::PgPool;
use teamgrid_core::models::{Capability, TeamAuthorization, TeamRole};
use teamgrid_core::AppError;
use uuid::Uuid;

use crate::stores::{MembershipStore, PermissionStore};

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for MembershipRepository {
    /// One read of the membership relation yields both `is_member` and
    /// `is_owner`; there is no window where the two could disagree.
    async fn get_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<TeamAuthorization, AppError> {
        let role = sqlx::query_scalar::<_, TeamRole>(
            r#"
            SELECT role
            FROM team_members
            WHERE user_id = $1 AND team_id = $2
            "#,
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user_id, team_id = %team_id, "Failed to fetch team membership");
            AppError::Database(e)
        })?;

        Ok(match role {
            Some(TeamRole::Owner) => TeamAuthorization::from_lookup(true, true),
            Some(TeamRole::Member) => TeamAuthorization::from_lookup(true, false),
            None => TeamAuthorization::non_member(),
        })
    }
}

#[async_trait]
impl PermissionStore for MembershipRepository {
    /// Look up one capability flag. A team without a permission row yields
    /// `NotFound`, which callers must treat as deny.
    async fn get_capability(
        &self,
        team_id: Uuid,
        capability: Capability,
    ) -> Result<bool, AppError> {
        // Closed enum switch; no caller-provided string ever reaches SQL.
        let query = match capability {
            Capability::Task => "SELECT allow_task FROM team_permissions WHERE team_id = $1",
            Capability::File => "SELECT allow_file FROM team_permissions WHERE team_id = $1",
            Capability::Invite => "SELECT allow_invite FROM team_permissions WHERE team_id = $1",
        };

        let allowed = sqlx::query_scalar::<_, bool>(query)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    team_id = %team_id,
                    capability = capability.as_str(),
                    "Failed to fetch team permission flag"
                );
                AppError::Database(e)
            })?;

        allowed.ok_or_else(|| {
            tracing::warn!(team_id = %team_id, "Team has no permission row");
            AppError::NotFound("Team permissions not found".to_string())
        })
    }
}
