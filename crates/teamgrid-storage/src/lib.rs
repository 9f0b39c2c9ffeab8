//! Teamgrid Storage Library
//!
//! This crate provides the blob storage abstraction and implementations for
//! Teamgrid: the `Storage` trait plus S3 and local-filesystem backends.
//!
//! Keys are opaque to the backends. Callers generate collision-resistant
//! names and an optional destination prefix (`{folder}/{filename}`); keys
//! must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use teamgrid_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
