//! Team-scoped authorization middleware: role resolution, capability gates,
//! and the owner-only gate.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use teamgrid_core::models::{Capability, TeamRole};
use teamgrid_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::auth::AuthUser;
use crate::services::authorization::AuthorizationService;

/// State for the team authorization middleware.
#[derive(Clone)]
pub struct TeamAuthState {
    pub authz: AuthorizationService,
}

/// Resolved team context, stamped into request extensions by [`team_auth`].
/// Only members ever carry this; a request without it was never team-scoped.
#[derive(Clone, Copy)]
pub struct TeamMembership {
    pub team_id: Uuid,
    pub role: TeamRole,
}

impl<S> FromRequestParts<S> for TeamMembership
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TeamMembership>()
            .copied()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing team authorization context".to_string(),
                ))
            })
    }
}

#[derive(Deserialize)]
pub struct TeamPathParams {
    team_id: Uuid,
}

/// `Identified -> RoleKnown`: resolve the caller's membership for the
/// team in the path and stamp [`TeamMembership`]. Non-members are rejected
/// here and never reach a handler. Must run after `jwt_auth`.
pub async fn team_auth(
    State(state): State<Arc<TeamAuthState>>,
    Path(params): Path<TeamPathParams>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthUser>().cloned() else {
        return HttpAppError(AppError::Unauthorized(
            "Missing authentication context".to_string(),
        ))
        .into_response();
    };

    let authorization = state.authz.resolve(user.user_id, params.team_id).await;
    let Some(role) = authorization.role() else {
        return HttpAppError(AppError::Unauthorized(
            "No permission to access team".to_string(),
        ))
        .into_response();
    };

    request.extensions_mut().insert(TeamMembership {
        team_id: params.team_id,
        role,
    });

    next.run(request).await
}

/// `RoleKnown -> CapabilityChecked`: owners pass every gate unconditionally;
/// members need the team's flag for this capability. Fail-closed on any
/// resolution failure. Must run after [`team_auth`].
async fn capability_gate(
    state: Arc<TeamAuthState>,
    capability: Capability,
    request: Request,
    next: Next,
    denied_message: &str,
) -> Response {
    let Some(membership) = request.extensions().get::<TeamMembership>().copied() else {
        return HttpAppError(AppError::Unauthorized(
            "Missing team authorization context".to_string(),
        ))
        .into_response();
    };

    if membership.role == TeamRole::Owner {
        return next.run(request).await;
    }

    if !state
        .authz
        .check_capability(membership.team_id, capability)
        .await
    {
        return HttpAppError(AppError::Unauthorized(denied_message.to_string())).into_response();
    }

    next.run(request).await
}

pub async fn require_task(
    State(state): State<Arc<TeamAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    capability_gate(
        state,
        Capability::Task,
        request,
        next,
        "No permission to manage tasks",
    )
    .await
}

pub async fn require_file(
    State(state): State<Arc<TeamAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    capability_gate(
        state,
        Capability::File,
        request,
        next,
        "No permission to manage files",
    )
    .await
}

pub async fn require_invite(
    State(state): State<Arc<TeamAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    capability_gate(
        state,
        Capability::Invite,
        request,
        next,
        "No permission to invite members",
    )
    .await
}

/// Ownership-only gate for team administration (settings, permissions,
/// deletion). Distinct from the capability flags: no flag can grant these
/// to a member. Must run after [`team_auth`].
pub async fn require_owner(request: Request, next: Next) -> Response {
    match request.extensions().get::<TeamMembership>() {
        Some(membership) if membership.role == TeamRole::Owner => next.run(request).await,
        Some(_) => HttpAppError(AppError::Unauthorized(
            "Only the owner has permission".to_string(),
        ))
        .into_response(),
        None => HttpAppError(AppError::Unauthorized(
            "Missing team authorization context".to_string(),
        ))
        .into_response(),
    }
}
