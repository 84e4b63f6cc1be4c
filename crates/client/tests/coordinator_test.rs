//! Upload coordinator behavior against an in-memory backend.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use docket_client::{
    ClientConfig, ClientError, LocalFile, ProgressFn, ProgressTracker, UploadBackend,
    UploadCoordinator, UploadMode, UploadOptions, UploadStatus,
};
use docket_shared::target::{FileRecord, Target, TargetStatus};
use docket_shared::upload::{
    DeleteFileResponse, FileDescriptor, PresignedGrant, UploadResponse, UploadedFile,
};
use uuid::Uuid;

#[derive(Default)]
struct Behavior {
    presign_error: Option<fn() -> ClientError>,
    put_fails_for: Option<&'static str>,
    put_delay: Option<Duration>,
    confirm_error: Option<fn() -> ClientError>,
    server_error: Option<fn() -> ClientError>,
}

#[derive(Default)]
struct FakeBackend {
    behavior: Behavior,
    presign_calls: AtomicUsize,
    put_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
    server_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    server_files: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            ..Self::default()
        })
    }

    fn calls(&self) -> (usize, usize, usize, usize) {
        (
            self.presign_calls.load(Ordering::SeqCst),
            self.put_calls.load(Ordering::SeqCst),
            self.confirm_calls.load(Ordering::SeqCst),
            self.server_calls.load(Ordering::SeqCst),
        )
    }
}

fn sample_target(files: Vec<FileRecord>) -> Target {
    let now = Utc::now();
    let status = if files.len() >= 2 {
        TargetStatus::Completed
    } else {
        TargetStatus::Pending
    };
    Target {
        id: Uuid::nil(),
        title: "Quarterly report".to_string(),
        description: String::new(),
        tags: vec![],
        assigned_date: now,
        target_date: now,
        document_count: 2,
        status,
        score: None,
        assigned_to: Uuid::nil(),
        files,
        created_at: now,
        updated_at: now,
    }
}

fn record(file_name: &str, file_size: u64) -> FileRecord {
    FileRecord {
        file_name: file_name.to_string(),
        file_url: format!("https://files.test/targets/u/{file_name}"),
        file_type: "application/pdf".to_string(),
        file_size,
        uploaded_at: Utc::now(),
    }
}

fn response(records: Vec<FileRecord>) -> UploadResponse {
    UploadResponse {
        message: "ok".to_string(),
        target: sample_target(records.clone()),
        uploaded_files: records,
    }
}

impl UploadBackend for FakeBackend {
    async fn presign(
        &self,
        _target_id: Uuid,
        files: &[FileDescriptor],
    ) -> Result<Vec<PresignedGrant>, ClientError> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make) = self.behavior.presign_error {
            return Err(make());
        }
        Ok(files
            .iter()
            .map(|f| PresignedGrant {
                key: format!("targets/u/{}", f.file_name),
                presigned_url: format!("https://storage.test/put/{}", f.file_name),
                file_url: format!("https://files.test/targets/u/{}", f.file_name),
                file_name: f.file_name.clone(),
                file_type: f.file_type.clone(),
                file_size: f.file_size,
                expires_at: Utc::now(),
            })
            .collect())
    }

    async fn put_object(
        &self,
        grant: &PresignedGrant,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Result<(), ClientError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.behavior.put_delay.unwrap_or(Duration::from_millis(10))).await;
        on_progress(data.len() as u64 / 2);
        on_progress(data.len() as u64);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.behavior.put_fails_for == Some(grant.file_name.as_str()) {
            return Err(ClientError::Network {
                operation: "put object".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    async fn confirm(
        &self,
        _target_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<UploadResponse, ClientError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make) = self.behavior.confirm_error {
            return Err(make());
        }
        Ok(response(
            files
                .iter()
                .map(|f| record(&f.file_name, f.file_size))
                .collect(),
        ))
    }

    async fn server_upload(
        &self,
        _target_id: Uuid,
        files: Vec<LocalFile>,
    ) -> Result<UploadResponse, ClientError> {
        self.server_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.server_files.lock() {
            seen.extend(files.iter().map(|f| f.file_name.clone()));
        }
        if let Some(make) = self.behavior.server_error {
            return Err(make());
        }
        Ok(response(
            files.iter().map(|f| record(&f.file_name, f.size())).collect(),
        ))
    }

    async fn remove(
        &self,
        _target_id: Uuid,
        file_url: &str,
    ) -> Result<DeleteFileResponse, ClientError> {
        Err(ClientError::NotFound(format!("{file_url} is not attached")))
    }
}

fn pdf(name: &str, len: usize) -> LocalFile {
    LocalFile::new(name, "application/pdf", Bytes::from(vec![1u8; len]))
}

fn tracker_for(files: &[LocalFile]) -> ProgressTracker {
    ProgressTracker::new(files.iter().map(|f| f.file_name.clone()))
}

fn coordinator(backend: &Arc<FakeBackend>) -> UploadCoordinator<FakeBackend> {
    UploadCoordinator::new(Arc::clone(backend), &ClientConfig::new("http://docket.test"))
}

#[tokio::test]
async fn test_direct_upload_confirms_every_file() {
    let backend = FakeBackend::with(Behavior::default());
    let files = vec![pdf("a.pdf", 100), pdf("b.pdf", 200)];
    let tracker = tracker_for(&files);

    let report = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap();

    assert_eq!(report.mode, UploadMode::Direct);
    assert!(report.fallback_reason.is_none());
    assert_eq!(report.response.uploaded_files.len(), 2);
    assert_eq!(report.response.target.status, TargetStatus::Completed);
    assert_eq!(backend.calls(), (1, 2, 1, 0));

    for file in tracker.snapshot() {
        assert_eq!(file.status, UploadStatus::Completed);
        assert_eq!(file.percent, 100);
    }
}

#[tokio::test]
async fn test_failed_put_falls_back_with_whole_batch() {
    let backend = FakeBackend::with(Behavior {
        put_fails_for: Some("b.pdf"),
        ..Behavior::default()
    });
    let files = vec![pdf("a.pdf", 100), pdf("b.pdf", 200)];
    let tracker = tracker_for(&files);

    let report = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap();

    assert_eq!(report.mode, UploadMode::ServerMediated);
    assert!(report.fallback_reason.unwrap().contains("connection reset"));
    assert_eq!(backend.calls(), (1, 2, 0, 1));
    assert_eq!(
        *backend.server_files.lock().unwrap(),
        vec!["a.pdf".to_string(), "b.pdf".to_string()]
    );
    assert!(
        tracker
            .snapshot()
            .iter()
            .all(|f| f.status == UploadStatus::Completed)
    );
}

#[tokio::test]
async fn test_forced_server_upload_over_ceiling_makes_no_calls() {
    let backend = FakeBackend::with(Behavior::default());
    let files = vec![pdf("big.bin", 60 * 1024 * 1024)];
    let tracker = tracker_for(&files);

    let err = coordinator(&backend)
        .upload(
            Uuid::nil(),
            files,
            UploadOptions {
                force_server_upload: true,
            },
            &tracker,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::PayloadTooLarge {
            size: 62_914_560,
            max: 52_428_800
        }
    ));
    assert_eq!(backend.calls(), (0, 0, 0, 0));
    assert_eq!(tracker.snapshot()[0].status, UploadStatus::Error);
}

#[tokio::test]
async fn test_forced_server_upload_skips_presign() {
    let backend = FakeBackend::with(Behavior::default());
    let files = vec![pdf("a.pdf", 10)];
    let tracker = tracker_for(&files);

    let report = coordinator(&backend)
        .upload(
            Uuid::nil(),
            files,
            UploadOptions {
                force_server_upload: true,
            },
            &tracker,
        )
        .await
        .unwrap();

    assert_eq!(report.mode, UploadMode::ServerMediated);
    assert!(report.fallback_reason.is_none());
    assert_eq!(backend.calls(), (0, 0, 0, 1));
}

#[tokio::test]
async fn test_failed_fallback_reports_direct_error() {
    let backend = FakeBackend::with(Behavior {
        put_fails_for: Some("a.pdf"),
        server_error: Some(|| ClientError::Api {
            status: 500,
            code: "storage_error".to_string(),
            message: "An error occurred".to_string(),
        }),
        ..Behavior::default()
    });
    let files = vec![pdf("a.pdf", 100)];
    let tracker = tracker_for(&files);

    let err = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network { .. }));
    assert_eq!(backend.calls(), (1, 1, 0, 1));
    let snapshot = tracker.snapshot();
    assert_eq!(snapshot[0].status, UploadStatus::Error);
    assert!(
        snapshot[0]
            .error
            .as_deref()
            .unwrap()
            .contains("connection reset")
    );
}

#[tokio::test]
async fn test_oversized_fallback_reports_direct_error() {
    let backend = FakeBackend::with(Behavior {
        put_fails_for: Some("big.bin"),
        ..Behavior::default()
    });
    let files = vec![pdf("big.bin", 2048)];
    let tracker = tracker_for(&files);
    let config = ClientConfig::new("http://docket.test").with_fallback_limit(1024);

    let err = UploadCoordinator::new(Arc::clone(&backend), &config)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network { .. }));
    assert_eq!(backend.calls(), (1, 1, 0, 0));
}

#[tokio::test]
async fn test_quota_error_from_presign_is_not_retried() {
    let backend = FakeBackend::with(Behavior {
        presign_error: Some(|| ClientError::QuotaExceeded {
            current: 2,
            requested: 2,
            max: 3,
        }),
        ..Behavior::default()
    });
    let files = vec![pdf("a.pdf", 10), pdf("b.pdf", 10)];
    let tracker = tracker_for(&files);

    let err = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Too many files. Maximum allowed: 3. Current: 2, trying to upload: 2"
    );
    assert_eq!(backend.calls(), (1, 0, 0, 0));
}

#[tokio::test]
async fn test_rejected_confirm_is_returned() {
    let backend = FakeBackend::with(Behavior {
        confirm_error: Some(|| ClientError::NotFound("Target not found".to_string())),
        ..Behavior::default()
    });
    let files = vec![pdf("a.pdf", 10)];
    let tracker = tracker_for(&files);

    let err = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(backend.calls(), (1, 1, 1, 0));
}

#[tokio::test]
async fn test_confirm_network_error_falls_back() {
    let backend = FakeBackend::with(Behavior {
        confirm_error: Some(|| ClientError::Network {
            operation: "confirm".to_string(),
            message: "connection refused".to_string(),
        }),
        ..Behavior::default()
    });
    let files = vec![pdf("a.pdf", 10)];
    let tracker = tracker_for(&files);

    let report = coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap();

    assert_eq!(report.mode, UploadMode::ServerMediated);
    assert_eq!(backend.calls(), (1, 1, 1, 1));
}

#[tokio::test]
async fn test_stalled_put_times_out_and_falls_back() {
    let backend = FakeBackend::with(Behavior {
        put_delay: Some(Duration::from_secs(10)),
        ..Behavior::default()
    });
    let files = vec![pdf("slow.pdf", 10)];
    let tracker = tracker_for(&files);
    let config =
        ClientConfig::new("http://docket.test").with_per_file_timeout(Duration::from_millis(20));

    let report = UploadCoordinator::new(Arc::clone(&backend), &config)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap();

    assert_eq!(report.mode, UploadMode::ServerMediated);
    assert!(report.fallback_reason.unwrap().contains("timed out"));
    assert_eq!(backend.calls(), (1, 1, 0, 1));
}

#[tokio::test]
async fn test_direct_puts_respect_concurrency_cap() {
    let backend = FakeBackend::with(Behavior {
        put_delay: Some(Duration::from_millis(30)),
        ..Behavior::default()
    });
    let files: Vec<LocalFile> = (0..10).map(|i| pdf(&format!("f{i}.pdf"), 10)).collect();
    let tracker = tracker_for(&files);

    coordinator(&backend)
        .upload(Uuid::nil(), files, UploadOptions::default(), &tracker)
        .await
        .unwrap();

    let peak = backend.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak in-flight was {peak}");
    assert!(peak >= 2, "transfers never overlapped");
    assert_eq!(backend.calls().1, 10);
}

#[tokio::test]
async fn test_remove_passes_through_backend_error() {
    let backend = FakeBackend::with(Behavior::default());
    let err = coordinator(&backend)
        .remove(Uuid::nil(), "https://files.test/targets/u/missing.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}
