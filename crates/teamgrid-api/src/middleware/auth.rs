//! JWT authentication middleware.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use teamgrid_core::AppError;
use teamgrid_db::SessionStore;
use uuid::Uuid;

use crate::auth::{TokenFactory, TokenType};
use crate::error::HttpAppError;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenFactory,
    pub sessions: Arc<dyn SessionStore>,
}

/// Authenticated caller identity, stamped into request extensions by
/// [`jwt_auth`]. Carries the raw access token so logout can revoke exactly
/// the session it was issued from.
#[derive(Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub access_token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Missing authentication context".to_string(),
            ))
        })
    }
}

fn bearer_token(request: &Request) -> Result<String, AppError> {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use Bearer format".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty bearer token".to_string()));
    }

    Ok(token.to_string())
}

/// `Unauthenticated -> Identified`: verify the bearer token and require a
/// matching active session (a verified token with no session row has been
/// revoked by logout). Stamps [`AuthUser`] on success.
pub async fn jwt_auth(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let claims = match auth.tokens.parse(&token, TokenType::Access) {
        Ok(claims) => claims,
        Err(e) => return HttpAppError(e).into_response(),
    };

    // Fail-closed: a session lookup failure denies, it never allows.
    match auth.sessions.find_active_session(claims.sub, &token).await {
        Ok(true) => {}
        Ok(false) => {
            return HttpAppError(AppError::Unauthorized(
                "You are not logged in".to_string(),
            ))
            .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %claims.sub, "Session lookup failed, denying");
            return HttpAppError(AppError::Unauthorized(
                "You are not logged in".to_string(),
            ))
            .into_response();
        }
    }

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        access_token: token,
    });

    next.run(request).await
}

#[derive(Deserialize)]
pub(crate) struct UserPathParams {
    user_id: Uuid,
}

/// Reject requests whose `user_id` path parameter is not the caller's own.
/// Must run after [`jwt_auth`].
pub async fn params_check(
    Path(params): Path<UserPathParams>,
    request: Request,
    next: Next,
) -> Response {
    let caller = request.extensions().get::<AuthUser>().cloned();
    match caller {
        Some(user) if user.user_id == params.user_id => next.run(request).await,
        _ => HttpAppError(AppError::Unauthorized(
            "No permission to access".to_string(),
        ))
        .into_response(),
    }
}
