//! Upload orchestrator behavior: batch validation, all-or-nothing
//! aggregation, download mode, and the batch deadline.

use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;

use teamgrid_api::{UploadPolicy, UploadService, UploadSource};
use teamgrid_core::AppError;
use teamgrid_storage::{Storage, StorageBackend, StorageError, StorageResult};

/// Records every put and can be told to fail the Nth call or to stall.
struct MockStorage {
    puts: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
}

impl MockStorage {
    fn new() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            delay: None,
        }
    }

    fn failing_on_call(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::new()
        }
    }

    fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    async fn recorded_puts(&self) -> Vec<(String, String)> {
        self.puts.lock().await.clone()
    }

    fn put_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(&self, key: &str, content_type: &str, _data: Vec<u8>) -> StorageResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on_call == Some(call) {
            return Err(StorageError::UploadFailed("injected put failure".to_string()));
        }

        self.puts
            .lock()
            .await
            .push((key.to_string(), content_type.to_string()));
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

/// Buffered source fixture.
struct TestFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

#[async_trait]
impl UploadSource for TestFile {
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

/// Source whose stream cannot be opened.
struct UnopenableFile {
    filename: String,
}

#[async_trait]
impl UploadSource for UnopenableFile {
    fn original_filename(&self) -> &str {
        &self.filename
    }

    fn declared_size(&self) -> u64 {
        4
    }

    fn content_type(&self) -> Option<&str> {
        None
    }

    async fn open(&self) -> std::io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "stream vanished",
        ))
    }
}

fn file(name: &str) -> Arc<dyn UploadSource> {
    Arc::new(TestFile {
        filename: name.to_string(),
        content_type: Some("image/png".to_string()),
        data: Bytes::from_static(b"file contents"),
    })
}

fn policy() -> UploadPolicy {
    UploadPolicy::new(
        vec![
            "png".to_string(),
            "jpg".to_string(),
            "jpeg".to_string(),
            "pdf".to_string(),
        ],
        2 * 1024 * 1024,
    )
}

fn service(storage: Arc<MockStorage>) -> UploadService {
    UploadService::new(storage, policy(), 5, Duration::from_secs(60))
}

#[tokio::test]
async fn test_batch_of_valid_files_succeeds() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let files = (0..5).map(|i| file(&format!("photo{}.png", i))).collect();
    let uploaded = service.upload_files(files, false, "team-1").await.unwrap();

    assert_eq!(uploaded.len(), 5);
    for entry in &uploaded {
        assert!(entry.file_name.ends_with(".png"));
        assert_eq!(entry.url, format!("mock://team-1/{}", entry.file_name));
    }

    let puts = storage.recorded_puts().await;
    assert_eq!(puts.len(), 5);
    assert!(puts.iter().all(|(key, _)| key.starts_with("team-1/")));
}

#[tokio::test]
async fn test_batch_is_all_or_nothing_on_put_failure() {
    let storage = Arc::new(MockStorage::failing_on_call(3));
    let service = service(storage.clone());

    let files = (0..5).map(|i| file(&format!("photo{}.png", i))).collect();
    let err = service
        .upload_files(files, false, "team-1")
        .await
        .unwrap_err();

    // Single aggregated error, zero successes reported, even though other
    // transfers may have completed.
    match err {
        AppError::Storage(msg) => assert!(msg.contains("upload file failed"), "message: {}", msg),
        other => panic!("Expected Storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_failure_aborts_before_any_transfer() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let files = vec![file("fine.png"), file("malware.exe"), file("also-fine.pdf")];
    let err = service
        .upload_files(files, false, "team-1")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(storage.put_count(), 0, "no transfer may start");
}

#[tokio::test]
async fn test_oversized_file_reports_ceiling_in_mb() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let big = Arc::new(TestFile {
        filename: "big.png".to_string(),
        content_type: None,
        data: Bytes::from(vec![0u8; 2 * 1024 * 1024 + 1]),
    });
    let err = service
        .upload_files(vec![big], false, "")
        .await
        .unwrap_err();

    match err {
        AppError::PayloadTooLarge(msg) => assert!(msg.contains("2 MB"), "message: {}", msg),
        other => panic!("Expected PayloadTooLarge, got {:?}", other),
    }
    assert_eq!(storage.put_count(), 0);
}

#[tokio::test]
async fn test_open_failure_fails_the_batch() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let files: Vec<Arc<dyn UploadSource>> = vec![
        file("ok.png"),
        Arc::new(UnopenableFile {
            filename: "gone.png".to_string(),
        }),
    ];
    let err = service.upload_files(files, false, "").await.unwrap_err();

    match err {
        AppError::Storage(msg) => assert!(msg.contains("open file failed"), "message: {}", msg),
        other => panic!("Expected Storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_mode_forces_binary_content_type() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let files = vec![file("a.png"), file("b.pdf")];
    service.upload_files(files, true, "").await.unwrap();

    let puts = storage.recorded_puts().await;
    assert_eq!(puts.len(), 2);
    assert!(puts
        .iter()
        .all(|(_, content_type)| content_type == "application/octet-stream"));
}

#[tokio::test]
async fn test_declared_content_type_used_when_serving() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    service
        .upload_files(vec![file("a.png")], false, "")
        .await
        .unwrap();

    let puts = storage.recorded_puts().await;
    assert_eq!(puts[0].1, "image/png");
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let storage = Arc::new(MockStorage::new());
    let service = service(storage.clone());

    let uploaded = service.upload_files(Vec::new(), false, "").await.unwrap();
    assert!(uploaded.is_empty());
    assert_eq!(storage.put_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_deadline_returns_timeout() {
    let storage = Arc::new(MockStorage::stalled(Duration::from_secs(600)));
    let service = UploadService::new(storage, policy(), 2, Duration::from_secs(30));

    let files = (0..3).map(|i| file(&format!("slow{}.png", i))).collect();
    let err = service.upload_files(files, false, "").await.unwrap_err();

    assert!(matches!(err, AppError::Timeout(_)));
}

#[tokio::test]
async fn test_more_files_than_workers_all_complete() {
    let storage = Arc::new(MockStorage::new());
    let service = UploadService::new(storage.clone(), policy(), 2, Duration::from_secs(60));

    let files = (0..12).map(|i| file(&format!("f{}.jpg", i))).collect();
    let uploaded = service.upload_files(files, false, "bulk").await.unwrap();

    assert_eq!(uploaded.len(), 12);
    assert_eq!(storage.put_count(), 12);
}
