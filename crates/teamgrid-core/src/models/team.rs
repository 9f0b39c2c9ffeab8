use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Team {
    pub team_id: Uuid,
    pub team_name: String,
    pub team_desc: Option<String>,
    /// Join code; rotatable by the owner.
    pub team_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a user inside a team. Derived per request from the membership
/// relation; never cached across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "team_role", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TeamRole {
    Owner,
    Member,
}

/// Membership row linking a user to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Per-team capability flags, one row per team. Flags only gate MEMBER
/// actions; the OWNER role bypasses all of them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamPermissions {
    pub team_id: Uuid,
    pub allow_task: bool,
    pub allow_file: bool,
    pub allow_invite: bool,
}

/// Member list row joined with the user's profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamMemberProfile {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// A named permission flag controlling MEMBER access to a team action.
///
/// Closed enum so an unvalidated string can never reach a permission lookup;
/// unknown values are rejected at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Task,
    File,
    Invite,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Task => "task",
            Capability::File => "file",
            Capability::Invite => "invite",
        }
    }
}

/// Authorization view for one (user, team) pair, computed fresh per request
/// from a single read of the membership relation.
///
/// Invariant: `is_owner` implies `is_member`; a non-member has no role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamAuthorization {
    pub is_member: bool,
    pub is_owner: bool,
}

impl TeamAuthorization {
    /// Build from one membership lookup. An owner row counts as membership
    /// even if the lookup reported them separately.
    pub fn from_lookup(is_member: bool, is_owner: bool) -> Self {
        Self {
            is_member: is_member || is_owner,
            is_owner,
        }
    }

    pub fn non_member() -> Self {
        Self {
            is_member: false,
            is_owner: false,
        }
    }

    /// Derived role: Owner if owner, Member if member, None otherwise.
    /// A `None` role must never proceed past authorization resolution.
    pub fn role(&self) -> Option<TeamRole> {
        if self.is_owner {
            Some(TeamRole::Owner)
        } else if self.is_member {
            Some(TeamRole::Member)
        } else {
            None
        }
    }
}
