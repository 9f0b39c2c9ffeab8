//! Application-wide constants.

/// Number of upload workers per request batch unless overridden by
/// `UPLOAD_WORKERS`.
pub const DEFAULT_UPLOAD_WORKERS: usize = 5;

/// Overall deadline for one upload batch unless overridden by
/// `UPLOAD_TIMEOUT_SECS`.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Upload size ceiling unless overridden by `MAX_FILE_SIZE_BYTES`.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// File extensions accepted for upload unless overridden by
/// `ALLOWED_EXTENSIONS`.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// Content type substituted for every job when a batch is uploaded in
/// download mode.
pub const OCTET_STREAM: &str = "application/octet-stream";
