//! Upload orchestrator: builds the job set for one request, drives the
//! worker pool, and aggregates outcomes into a response or a single error.

use std::sync::Arc;
use std::time::Duration;

use teamgrid_core::models::UploadedFile;
use teamgrid_core::{constants, AppError, Config};
use teamgrid_storage::Storage;
use tokio::sync::mpsc;

use super::policy::UploadPolicy;
use super::pool::spawn_workers;
use super::types::{UploadJob, UploadSource};

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn Storage>,
    policy: UploadPolicy,
    workers: usize,
    timeout: Duration,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn Storage>,
        policy: UploadPolicy,
        workers: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            storage,
            policy,
            workers: workers.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Self {
        Self::new(
            storage,
            UploadPolicy::new(config.allowed_extensions.clone(), config.max_file_size_bytes),
            config.upload_workers,
            Duration::from_secs(config.upload_timeout_secs),
        )
    }

    /// Upload a batch of files under `folder`, all-or-nothing.
    ///
    /// The whole batch is validated before any transfer begins; the first
    /// invalid file aborts it. After submission the batch either completes
    /// fully or returns the first failure; partial successes are never
    /// reported. Result order is completion order, not input order - callers
    /// needing positional correspondence must re-key by filename.
    ///
    /// `is_download` substitutes a generic binary content type for every
    /// job, for batches not destined for content-type-sensitive serving.
    pub async fn upload_files(
        &self,
        files: Vec<Arc<dyn UploadSource>>,
        is_download: bool,
        folder: &str,
    ) -> Result<Vec<UploadedFile>, AppError> {
        let mut jobs = Vec::with_capacity(files.len());
        for source in files {
            let extension = self
                .policy
                .validate(source.original_filename(), source.declared_size())?;
            let file_name = UploadPolicy::generate_file_name(&extension);

            let content_type = if is_download {
                constants::OCTET_STREAM.to_string()
            } else {
                source
                    .content_type()
                    .unwrap_or(constants::OCTET_STREAM)
                    .to_string()
            };

            let folder = folder.trim_matches('/');
            let destination = if folder.is_empty() {
                file_name.clone()
            } else {
                format!("{}/{}", folder, file_name)
            };

            jobs.push(UploadJob {
                origin_filename: source.original_filename().to_string(),
                size: source.declared_size(),
                source,
                file_name,
                destination,
                extension,
                content_type,
            });
        }

        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let batch = jobs.len();
        tracing::info!(batch, workers = self.workers, "starting upload batch");

        // All jobs are enqueued before any worker starts, then the queue is
        // closed; this pool instance serves exactly this batch.
        let (jobs_tx, jobs_rx) = mpsc::channel(batch);
        let (results_tx, mut results_rx) = mpsc::channel(batch);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(batch);

        for job in jobs {
            jobs_tx
                .try_send(job)
                .map_err(|_| AppError::Internal("upload job queue rejected a job".to_string()))?;
        }
        drop(jobs_tx);

        let handles = spawn_workers(
            self.workers,
            self.storage.clone(),
            jobs_rx,
            results_tx,
            outcome_tx,
        );

        // Exactly `batch` outcome signals tell us the batch is complete; a
        // result is read only when its signal was a success.
        let collect = async {
            let mut uploaded = Vec::with_capacity(batch);
            for _ in 0..batch {
                match outcome_rx.recv().await {
                    Some(Ok(())) => match results_rx.recv().await {
                        Some(file) => uploaded.push(file),
                        None => {
                            return Err(AppError::Internal(
                                "upload result channel closed early".to_string(),
                            ))
                        }
                    },
                    Some(Err(err)) => {
                        // Abandon the batch; workers still in flight drain
                        // into the buffered channels and exit on their own.
                        return Err(AppError::Storage(format!("upload file failed: {}", err)));
                    }
                    None => {
                        return Err(AppError::Internal(
                            "upload outcome channel closed early".to_string(),
                        ))
                    }
                }
            }
            Ok(uploaded)
        };

        match tokio::time::timeout(self.timeout, collect).await {
            Ok(result) => result,
            Err(_) => {
                for handle in &handles {
                    handle.abort();
                }
                tracing::warn!(
                    batch,
                    timeout_secs = self.timeout.as_secs(),
                    "upload batch deadline expired"
                );
                Err(AppError::Timeout(format!(
                    "Upload did not complete within {} seconds",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
