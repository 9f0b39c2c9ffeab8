//! Request middleware: authentication and team permission gating.
//!
//! The chain is strictly ordered. `jwt_auth` stamps the caller identity,
//! `team_auth` stamps the caller's team role, and the capability/owner gates
//! consult it. A rejection at any step short-circuits the rest; no handler
//! runs without the full chain having passed.

pub mod auth;
pub mod team;

pub use auth::{jwt_auth, params_check, AuthState, AuthUser};
pub use team::{
    require_file, require_invite, require_owner, require_task, team_auth, TeamAuthState,
    TeamMembership,
};
