//! Store trait abstractions consumed by the authorization layer
//!
//! These traits define the minimal interface the middleware chain and the
//! authorization resolver need from the database, allowing for easy mocking
//! and testing without database dependencies.

use async_trait::async_trait;
use teamgrid_core::models::{Capability, TeamAuthorization};
use teamgrid_core::AppError;
use uuid::Uuid;

/// Active-session lookup used by the authentication middleware. A token that
/// verifies cryptographically but has no session row is revoked.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_active_session(
        &self,
        user_id: Uuid,
        access_token: &str,
    ) -> Result<bool, AppError>;
}

/// Membership/role lookup. One read of the membership relation returns both
/// membership and ownership so two separate checks can never observe
/// different states.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<TeamAuthorization, AppError>;
}

/// Capability-flag lookup against a team's permission row. A missing row is
/// an error, which callers must map to deny.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_capability(&self, team_id: Uuid, capability: Capability)
        -> Result<bool, AppError>;
}
