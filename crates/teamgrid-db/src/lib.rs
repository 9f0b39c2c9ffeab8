//! Teamgrid Database Layer
//!
//! This crate provides database repositories and data access for teams,
//! members, tasks, files, users, and sessions.

// Module declarations
pub mod db;
pub mod stores;

// Re-exports: repositories
pub use db::{
    FileRepository, MembershipRepository, SessionRepository, TaskRepository, TeamRepository,
    UserRepository,
};

// Re-exports: store seams consumed by the authorization layer
pub use stores::{MembershipStore, PermissionStore, SessionStore};
