//! Bounded worker pool: fan-out of upload jobs, fan-in of outcomes.
//!
//! One pool instance serves exactly one request's batch. All jobs are
//! enqueued before the workers are spawned and the queue is closed, so a
//! worker observing an empty queue is done. Every job produces exactly one
//! signal on the outcome channel (`Ok(())` on success, the failure
//! otherwise) and, only on success, one entry on the results channel. Both
//! channels are sized to the batch so a send can never block.

use std::sync::Arc;

use teamgrid_core::models::UploadedFile;
use teamgrid_storage::Storage;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::types::{UploadError, UploadJob};

/// Spawn `workers` tasks draining `jobs`. Returns the join handles so the
/// orchestrator can abort in-flight transfers when the batch deadline
/// expires.
pub(crate) fn spawn_workers(
    workers: usize,
    storage: Arc<dyn Storage>,
    jobs: mpsc::Receiver<UploadJob>,
    results_tx: mpsc::Sender<UploadedFile>,
    outcome_tx: mpsc::Sender<Result<(), UploadError>>,
) -> Vec<JoinHandle<()>> {
    let jobs = Arc::new(Mutex::new(jobs));

    (0..workers)
        .map(|worker_id| {
            let storage = storage.clone();
            let jobs = jobs.clone();
            let results_tx = results_tx.clone();
            let outcome_tx = outcome_tx.clone();
            tokio::spawn(async move {
                run_worker(worker_id, storage, jobs, results_tx, outcome_tx).await;
            })
        })
        .collect()
}

async fn run_worker(
    worker_id: usize,
    storage: Arc<dyn Storage>,
    jobs: Arc<Mutex<mpsc::Receiver<UploadJob>>>,
    results_tx: mpsc::Sender<UploadedFile>,
    outcome_tx: mpsc::Sender<Result<(), UploadError>>,
) {
    loop {
        // The queue is pre-filled and closed, so this never waits on a
        // producer; holding the lock across recv only serializes handoff.
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            break; // queue drained
        };

        match process_job(storage.as_ref(), &job).await {
            Ok(uploaded) => {
                tracing::debug!(
                    worker_id,
                    file_name = %uploaded.file_name,
                    origin = %job.origin_filename,
                    "uploaded file"
                );
                // Channels hold the whole batch; sends cannot block. The
                // receiver may already be gone if the batch was abandoned.
                let _ = outcome_tx.send(Ok(())).await;
                let _ = results_tx.send(uploaded).await;
            }
            Err(err) => {
                tracing::warn!(
                    worker_id,
                    origin = %job.origin_filename,
                    error = %err,
                    "upload job failed, worker stopping"
                );
                let _ = outcome_tx.send(Err(err)).await;
                // Fail-fast per worker: stop pulling jobs. Other workers
                // keep draining the queue independently.
                return;
            }
        }
    }
}

/// Transfer one job: open its stream, read it, issue a single put. The
/// stream is dropped on every exit path before the worker takes another job.
async fn process_job(storage: &dyn Storage, job: &UploadJob) -> Result<UploadedFile, UploadError> {
    let mut stream = job
        .source
        .open()
        .await
        .map_err(|e| UploadError::Open(e.to_string()))?;

    let mut data = Vec::with_capacity(job.size as usize);
    stream
        .read_to_end(&mut data)
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;
    drop(stream);

    let url = storage
        .put(&job.destination, &job.content_type, data)
        .await
        .map_err(|e| UploadError::Put(e.to_string()))?;

    Ok(UploadedFile {
        file_name: job.file_name.clone(),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upload::types::BufferedSource;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use teamgrid_storage::{StorageBackend, StorageError, StorageResult};

    /// Storage that fails any put whose key contains "fail".
    struct FlakyStorage {
        puts: AtomicUsize,
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn put(
            &self,
            key: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> StorageResult<String> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if key.contains("fail") {
                return Err(StorageError::UploadFailed("injected failure".to_string()));
            }
            Ok(format!("mock://{}", key))
        }

        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(true)
        }

        fn public_url(&self, key: &str) -> String {
            format!("mock://{}", key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    fn job(name: &str) -> UploadJob {
        UploadJob {
            source: Arc::new(BufferedSource::new(
                format!("{}.png", name),
                Some("image/png".to_string()),
                Bytes::from_static(b"data"),
            )),
            file_name: format!("{}.png", name),
            origin_filename: format!("{}.png", name),
            destination: format!("batch/{}.png", name),
            extension: "png".to_string(),
            content_type: "image/png".to_string(),
            size: 4,
        }
    }

    async fn run_pool(
        jobs: Vec<UploadJob>,
        workers: usize,
    ) -> (Vec<Result<(), UploadError>>, Vec<UploadedFile>) {
        let n = jobs.len();
        let (jobs_tx, jobs_rx) = mpsc::channel(n);
        let (results_tx, mut results_rx) = mpsc::channel(n);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(n);

        for j in jobs {
            jobs_tx.try_send(j).unwrap();
        }
        drop(jobs_tx);

        let storage: Arc<dyn Storage> = Arc::new(FlakyStorage {
            puts: AtomicUsize::new(0),
        });
        spawn_workers(workers, storage, jobs_rx, results_tx, outcome_tx);

        let mut outcomes = Vec::new();
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }
        let mut results = Vec::new();
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }
        (outcomes, results)
    }

    #[tokio::test]
    async fn test_every_job_yields_exactly_one_outcome() {
        let jobs = (0..8).map(|i| job(&format!("f{}", i))).collect();
        let (outcomes, results) = run_pool(jobs, 3).await;

        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(results.len(), 8);

        let names: HashSet<_> = results.iter().map(|r| r.file_name.clone()).collect();
        assert_eq!(names.len(), 8);
    }

    #[tokio::test]
    async fn test_failure_emits_one_error_and_no_result() {
        let mut jobs: Vec<UploadJob> = (0..5).map(|i| job(&format!("f{}", i))).collect();
        jobs.push(job("fail-me"));

        let (outcomes, results) = run_pool(jobs, 2).await;

        // One signal per job even though a worker died mid-batch; the
        // surviving workers drained the rest of the queue.
        assert_eq!(outcomes.len(), 6);
        assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| !r.file_name.contains("fail")));
    }

    #[tokio::test]
    async fn test_single_worker_drains_queue_in_order() {
        let jobs = (0..4).map(|i| job(&format!("f{}", i))).collect();
        let (outcomes, results) = run_pool(jobs, 1).await;

        assert_eq!(outcomes.len(), 4);
        // With one worker, completion order is submission order.
        let names: Vec<_> = results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["f0.png", "f1.png", "f2.png", "f3.png"]);
    }
}
