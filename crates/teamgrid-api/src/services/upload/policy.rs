//! Upload validation and storage-name generation.

use teamgrid_core::AppError;
use uuid::Uuid;

/// Extension allow-list and size ceiling for uploaded files.
#[derive(Clone, Debug)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    max_file_size: usize,
}

impl UploadPolicy {
    pub fn new(allowed_extensions: Vec<String>, max_file_size: usize) -> Self {
        Self {
            allowed_extensions,
            max_file_size,
        }
    }

    /// Size ceiling in whole megabytes, rounded up. Used in the rejection
    /// message so the client sees the configured limit.
    pub fn max_size_mb(&self) -> usize {
        self.max_file_size.div_ceil(1024 * 1024)
    }

    /// Validate one candidate file and return its extension.
    ///
    /// The extension is the substring after the last `.`, compared against
    /// the allow-list exactly as provided.
    pub fn validate(&self, original_filename: &str, declared_size: u64) -> Result<String, AppError> {
        let extension = match original_filename.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        };

        if extension.is_empty() || !self.allowed_extensions.iter().any(|e| e == extension) {
            return Err(AppError::InvalidInput(
                "Invalid file extension".to_string(),
            ));
        }

        if declared_size > self.max_file_size as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "File size must be less than {} MB",
                self.max_size_mb()
            )));
        }

        Ok(extension.to_string())
    }

    /// Collision-resistant storage name preserving the validated extension.
    /// The client-sent name never becomes a storage key.
    pub fn generate_file_name(extension: &str) -> String {
        format!("{}.{}", Uuid::new_v4(), extension)
    }
}
