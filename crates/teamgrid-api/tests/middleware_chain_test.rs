//! Middleware chain behavior: every transition of the request lifecycle
//! either forwards or terminates, and a terminal rejection never reaches the
//! handler.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use axum_test::TestServer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use teamgrid_api::auth::TokenFactory;
use teamgrid_api::middleware::{
    jwt_auth, require_owner, require_task, team_auth, AuthState, AuthUser, TeamAuthState,
    TeamMembership,
};
use teamgrid_api::AuthorizationService;
use teamgrid_core::models::{Capability, TeamAuthorization};
use teamgrid_core::AppError;
use teamgrid_db::{MembershipStore, PermissionStore, SessionStore};

#[derive(Default)]
struct MockSessionStore {
    active: HashSet<(Uuid, String)>,
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn find_active_session(
        &self,
        user_id: Uuid,
        access_token: &str,
    ) -> Result<bool, AppError> {
        Ok(self.active.contains(&(user_id, access_token.to_string())))
    }
}

#[derive(Default)]
struct MockMembershipStore {
    rows: HashMap<(Uuid, Uuid), (bool, bool)>,
}

#[async_trait]
impl MembershipStore for MockMembershipStore {
    async fn get_membership(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<TeamAuthorization, AppError> {
        Ok(match self.rows.get(&(user_id, team_id)) {
            Some(&(is_member, is_owner)) => TeamAuthorization::from_lookup(is_member, is_owner),
            None => TeamAuthorization::non_member(),
        })
    }
}

#[derive(Default)]
struct MockPermissionStore {
    flags: HashMap<Uuid, (bool, bool, bool)>,
}

#[async_trait]
impl PermissionStore for MockPermissionStore {
    async fn get_capability(
        &self,
        team_id: Uuid,
        capability: Capability,
    ) -> Result<bool, AppError> {
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

struct Fixture {
    server: TestServer,
    owner: Uuid,
    team: Uuid,
}

impl Fixture {
    /// One team: an owner, a member, and whatever capability flags the test
    /// wants. Sessions exist for both users plus a "revoked" user whose
    /// token verifies but has no session row.
    fn new(flags: Option<(bool, bool, bool)>) -> (Self, String, String, String) {
        let tokens = TokenFactory::new("test-secret", 24, 24 * 7);
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let revoked = Uuid::new_v4();
        let team = Uuid::new_v4();

        let owner_token = tokens.sign_access(owner).unwrap();
        let member_token = tokens.sign_access(member).unwrap();
        let revoked_token = tokens.sign_access(revoked).unwrap();

        let mut sessions = HashSet::new();
        sessions.insert((owner, owner_token.clone()));
        sessions.insert((member, member_token.clone()));

        let mut rows = HashMap::new();
        rows.insert((owner, team), (true, true));
        rows.insert((member, team), (true, false));

        let mut flag_rows = HashMap::new();
        if let Some(flags) = flags {
            flag_rows.insert(team, flags);
        }

        let auth_state = Arc::new(AuthState {
            tokens: tokens.clone(),
            sessions: Arc::new(MockSessionStore { active: sessions }),
        });
        let team_state = Arc::new(TeamAuthState {
            authz: AuthorizationService::new(
                Arc::new(MockMembershipStore { rows }),
                Arc::new(MockPermissionStore { flags: flag_rows }),
            ),
        });

        let team_router = Router::new()
            .route(
                "/about",
                get(|membership: TeamMembership| async move {
                    format!("role: {:?}", membership.role)
                }),
            )
            .route(
                "/task",
                post(|| async { "task created" })
                    .route_layer(from_fn_with_state(team_state.clone(), require_task)),
            )
            .route(
                "/",
                delete(|| async { "team deleted" }).route_layer(from_fn(require_owner)),
            )
            .layer(from_fn_with_state(team_state.clone(), team_auth));

        let app = Router::new()
            .route(
                "/me",
                get(|user: AuthUser| async move { user.user_id.to_string() }),
            )
            .nest("/team/{team_id}", team_router)
            .layer(from_fn_with_state(auth_state, jwt_auth));

        let server = TestServer::new(app).unwrap();
        (
            Self {
                server,
                owner,
                team,
            },
            owner_token,
            member_token,
            revoked_token,
        )
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_missing_credential_is_rejected() {
    let (fixture, ..) = Fixture::new(None);
    let response = fixture.server.get("/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_credential_is_rejected() {
    let (fixture, ..) = Fixture::new(None);
    let response = fixture
        .server
        .get("/me")
        .add_header("authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_credential_is_rejected() {
    // The token verifies cryptographically but no session row exists.
    let (fixture, _, _, revoked_token) = Fixture::new(None);
    let response = fixture
        .server
        .get("/me")
        .add_header("authorization", bearer(&revoked_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_credential_reaches_handler() {
    let (fixture, owner_token, ..) = Fixture::new(None);
    let response = fixture
        .server
        .get("/me")
        .add_header("authorization", bearer(&owner_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), fixture.owner.to_string());
}

#[tokio::test]
async fn test_non_member_is_rejected_before_handler() {
    let (fixture, owner_token, ..) = Fixture::new(Some((true, true, true)));
    let other_team = Uuid::new_v4();

    let response = fixture
        .server
        .get(&format!("/team/{}/about", other_team))
        .add_header("authorization", bearer(&owner_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_passes_membership_gate() {
    let (fixture, _, member_token, _) = Fixture::new(Some((true, true, true)));
    let response = fixture
        .server
        .get(&format!("/team/{}/about", fixture.team))
        .add_header("authorization", bearer(&member_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "role: Member");
}

#[tokio::test]
async fn test_member_denied_when_capability_flag_off() {
    let (fixture, _, member_token, _) = Fixture::new(Some((false, true, true)));
    let response = fixture
        .server
        .post(&format!("/team/{}/task", fixture.team))
        .add_header("authorization", bearer(&member_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_passes_when_capability_flag_on() {
    let (fixture, _, member_token, _) = Fixture::new(Some((true, true, true)));
    let response = fixture
        .server
        .post(&format!("/team/{}/task", fixture.team))
        .add_header("authorization", bearer(&member_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_owner_bypasses_disabled_capability_flag() {
    let (fixture, owner_token, ..) = Fixture::new(Some((false, false, false)));
    let response = fixture
        .server
        .post(&format!("/team/{}/task", fixture.team))
        .add_header("authorization", bearer(&owner_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_member_denied_when_permission_row_missing() {
    // Fail-closed: no permission row resolves to deny, not allow.
    let (fixture, _, member_token, _) = Fixture::new(None);
    let response = fixture
        .server
        .post(&format!("/team/{}/task", fixture.team))
        .add_header("authorization", bearer(&member_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_gate_rejects_member() {
    let (fixture, _, member_token, _) = Fixture::new(Some((true, true, true)));
    let response = fixture
        .server
        .delete(&format!("/team/{}", fixture.team))
        .add_header("authorization", bearer(&member_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_gate_admits_owner() {
    let (fixture, owner_token, ..) = Fixture::new(Some((true, true, true)));
    let response = fixture
        .server
        .delete(&format!("/team/{}", fixture.team))
        .add_header("authorization", bearer(&owner_token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejection_body_is_structured() {
    let (fixture, ..) = Fixture::new(None);
    let response = fixture.server.get("/me").await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["error"].is_string());
}
