//! Authorization resolver behavior: fail-closed membership, capability
//! lookups, and isolation of concurrent resolutions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use teamgrid_api::AuthorizationService;
use teamgrid_core::models::{Capability, TeamAuthorization, TeamRole};
use teamgrid_core::AppError;
use teamgrid_db::{MembershipStore, PermissionStore};

#[derive(Default)]
struct MockMembershipStore {
    // (user, team) -> (is_member, is_owner)
    rows: HashMap<(Uuid, Uuid), (bool, bool)>,
    failing: bool,
}

#[async_trait]
impl MembershipStore for MockMembershipStore {
    async fn get_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<TeamAuthorization, AppError> {
        if self.failing {
            return Err(AppError::Internal("membership lookup exploded".to_string()));
        }
        Ok(match self.rows.get(&(user_id, team_id)) {
            Some(&(is_member, is_owner)) => TeamAuthorization::from_lookup(is_member, is_owner),
            None => TeamAuthorization::non_member(),
        })
    }
}

#[derive(Default)]
struct MockPermissionStore {
    // team -> (allow_task, allow_file, allow_invite)
    flags: HashMap<Uuid, (bool, bool, bool)>,
    failing: bool,
}

#[async_trait]
impl PermissionStore for MockPermissionStore {
    async fn get_capability(
        &self,
        team_id: Uuid,
        capability: Capability,
    ) -> Result<bool, AppError> {
        if self.failing {
            return Err(AppError::Internal("permission lookup exploded".to_string()));
        }
        let flags = self
            .flags
            .get(&team_id)
            .ok_or_else(|| AppError::NotFound("Team permissions not found".to_string()))?;
        Ok(match capability {
            Capability::Task => flags.0,
            Capability::File => flags.1,
            Capability::Invite => flags.2,
        })
    }
}

fn service(
    memberships: MockMembershipStore,
    permissions: MockPermissionStore,
) -> AuthorizationService {
    AuthorizationService::new(Arc::new(memberships), Arc::new(permissions))
}

#[tokio::test]
async fn test_unknown_pair_resolves_to_no_role() {
    let service = service(MockMembershipStore::default(), MockPermissionStore::default());

    let auth = service.resolve(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(!auth.is_member);
    assert!(!auth.is_owner);
    assert_eq!(auth.role(), None);
}

#[tokio::test]
async fn test_missing_permission_row_denies_every_capability() {
    let team = Uuid::new_v4();
    let service = service(MockMembershipStore::default(), MockPermissionStore::default());

    for capability in [Capability::Task, Capability::File, Capability::Invite] {
        assert!(
            !service.check_capability(team, capability).await,
            "{:?} must be denied without a permission row",
            capability
        );
    }
}

#[tokio::test]
async fn test_lookup_failures_resolve_to_deny() {
    let memberships = MockMembershipStore {
        failing: true,
        ..Default::default()
    };
    let permissions = MockPermissionStore {
        failing: true,
        ..Default::default()
    };
    let service = service(memberships, permissions);

    let auth = service.resolve(Uuid::new_v4(), Uuid::new_v4()).await;
    assert_eq!(auth.role(), None);
    assert!(!service.check_capability(Uuid::new_v4(), Capability::File).await);
}

#[tokio::test]
async fn test_member_and_owner_roles_resolve() {
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let team = Uuid::new_v4();

    let mut rows = HashMap::new();
    rows.insert((owner, team), (true, true));
    rows.insert((member, team), (true, false));
    let service = service(
        MockMembershipStore {
            rows,
            ..Default::default()
        },
        MockPermissionStore::default(),
    );

    assert_eq!(service.resolve(owner, team).await.role(), Some(TeamRole::Owner));
    assert_eq!(
        service.resolve(member, team).await.role(),
        Some(TeamRole::Member)
    );
}

#[tokio::test]
async fn test_capability_flags_answer_independently() {
    let team = Uuid::new_v4();
    let mut flags = HashMap::new();
    flags.insert(team, (true, false, true));
    let service = service(
        MockMembershipStore::default(),
        MockPermissionStore {
            flags,
            ..Default::default()
        },
    );

    assert!(service.check_capability(team, Capability::Task).await);
    assert!(!service.check_capability(team, Capability::File).await);
    assert!(service.check_capability(team, Capability::Invite).await);
}

#[tokio::test]
async fn test_concurrent_resolutions_do_not_interfere() {
    let owner = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let team = Uuid::new_v4();

    let mut rows = HashMap::new();
    rows.insert((owner, team), (true, true));
    let service = service(
        MockMembershipStore {
            rows,
            ..Default::default()
        },
        MockPermissionStore::default(),
    );

    let (a, b) = tokio::join!(service.resolve(owner, team), service.resolve(outsider, team));

    assert_eq!(a.role(), Some(TeamRole::Owner));
    assert_eq!(b.role(), None);
}
