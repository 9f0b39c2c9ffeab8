//! Database repositories for the data access layer
//!
//! Each repository is responsible for a specific domain entity and provides
//! CRUD operations and specialized queries over a shared `PgPool`.

pub mod file;
pub mod membership;
pub mod session;
pub mod task;
pub mod team;
pub mod user;

pub use file::FileRepository;
pub use membership::MembershipRepository;
pub use session::SessionRepository;
pub use task::TaskRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
