//! Concurrent multi-file upload pipeline.
//!
//! A request's files are validated by the [`UploadPolicy`], turned into jobs
//! with collision-resistant storage names, and fanned out to a bounded pool
//! of workers that stream each file to the storage backend. Outcomes are
//! collected by the orchestrator in [`service`]; any failure abandons the
//! whole batch.

pub mod policy;
pub mod pool;
pub mod service;
pub mod types;

pub use policy::UploadPolicy;
pub use service::UploadService;
pub use types::{BufferedSource, UploadError, UploadJob, UploadSource};
