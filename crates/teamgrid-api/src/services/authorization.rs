//! Authorization state resolution.
//!
//! Computes a fresh [`TeamAuthorization`] per request from the membership
//! store and answers capability questions against the permission store.
//! Resolution reads a consistent snapshot and performs no writes, so
//! concurrent resolutions for different requests need no coordination.

use std::sync::Arc;

use teamgrid_core::models::{Capability, TeamAuthorization};
use teamgrid_core::AppError;
use teamgrid_db::{MembershipStore, PermissionStore};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthorizationService {
    memberships: Arc<dyn MembershipStore>,
    permissions: Arc<dyn PermissionStore>,
}

impl AuthorizationService {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            memberships,
            permissions,
        }
    }

    /// Resolve membership and ownership for one (user, team) pair.
    ///
    /// Backed by a single read of the membership relation, so `is_member`
    /// and `is_owner` can never disagree. A lookup failure resolves to
    /// non-member: authorization data that cannot be read denies access.
    pub async fn resolve(&self, user_id: Uuid, team_id: Uuid) -> TeamAuthorization {
        match self.memberships.get_membership(user_id, team_id).await {
            Ok(authorization) => authorization,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    team_id = %team_id,
                    "Membership resolution failed, denying access"
                );
                TeamAuthorization::non_member()
            }
        }
    }

    /// Check one capability flag for a team.
    ///
    /// Fail-closed: a missing permission row or a lookup failure answers
    /// `false`, never `true`.
    pub async fn check_capability(&self, team_id: Uuid, capability: Capability) -> bool {
        match self.permissions.get_capability(team_id, capability).await {
            Ok(allowed) => allowed,
            Err(e) => {
                match e {
                    AppError::NotFound(_) => tracing::warn!(
                        team_id = %team_id,
                        capability = capability.as_str(),
                        "No permission row for team, denying"
                    ),
                    _ => tracing::error!(
                        error = %e,
                        team_id = %team_id,
                        capability = capability.as_str(),
                        "Capability lookup failed, denying"
                    ),
                }
                false
            }
        }
    }
}
