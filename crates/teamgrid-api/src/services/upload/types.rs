//! Upload job types and the file-source seam.

use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// One file in an upload request, before validation.
///
/// The source owns nothing until a worker calls [`UploadSource::open`]; the
/// returned stream is read once by exactly that worker and released before
/// the worker takes its next job.
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Filename as sent by the client. Display only; never a storage key.
    fn original_filename(&self) -> &str;

    /// Size declared by the client, validated against the policy ceiling.
    fn declared_size(&self) -> u64;

    /// Declared content type, if any.
    fn content_type(&self) -> Option<&str>;

    /// Open the underlying stream.
    async fn open(&self) -> std::io::Result<Pin<Box<dyn AsyncRead + Send>>>;
}

/// Source backed by bytes already read from a multipart field.
pub struct BufferedSource {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

impl BufferedSource {
    pub fn new(filename: String, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            filename,
            content_type,
            data,
        }
    }
}

#[async_trait]
impl UploadSource for BufferedSource {
    fn original_filename(&self) -> &str {
        &self.filename
    }

    fn declared_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn open(&self) -> std::io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        Ok(Box::pin(std::io::Cursor::new(self.data.clone())))
    }
}

/// One validated file pending transfer. Owned exclusively by the worker that
/// processes it.
pub struct UploadJob {
    pub source: Arc<dyn UploadSource>,
    /// Generated storage name (`{uuid}.{ext}`).
    pub file_name: String,
    /// Client-sent name, kept for display.
    pub origin_filename: String,
    /// Full storage key: `{folder}/{file_name}`, or just the name.
    pub destination: String,
    pub extension: String,
    pub content_type: String,
    pub size: u64,
}

/// Failure of one upload job.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("open file failed: {0}")]
    Open(String),

    #[error("read file failed: {0}")]
    Read(String),

    #[error("put object failed: {0}")]
    Put(String),
}
