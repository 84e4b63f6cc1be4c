//! Concurrent direct-to-storage PUTs.

use std::sync::Arc;
use std::time::Duration;

use docket_shared::upload::{PresignedGrant, UploadedFile};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::backend::{ProgressFn, UploadBackend};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::file::LocalFile;
use crate::progress::ProgressTracker;

/// Runs one PUT per grant, at most `max_concurrency` at a time.
#[derive(Debug, Clone)]
pub struct DirectUploader {
    max_concurrency: usize,
    per_file_timeout: Duration,
}

impl DirectUploader {
    /// Creates an uploader. A zero cap is treated as 1.
    #[must_use]
    pub fn new(max_concurrency: usize, per_file_timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            per_file_timeout,
        }
    }

    /// Uploader with the limits from `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_concurrency, config.per_file_timeout)
    }

    /// PUTs `files[i]` to `grants[i]` and returns the confirm tuples.
    ///
    /// Every transfer runs to completion or timeout even after a sibling
    /// fails; the first failure in file order is returned.
    pub async fn upload_all<B: UploadBackend>(
        &self,
        backend: &B,
        grants: &[PresignedGrant],
        files: &[LocalFile],
        tracker: &ProgressTracker,
    ) -> Result<Vec<UploadedFile>, ClientError> {
        if grants.len() != files.len() {
            return Err(ClientError::Api {
                status: 0,
                code: "grant_mismatch".to_string(),
                message: format!("{} grants for {} files", grants.len(), files.len()),
            });
        }

        let semaphore = Semaphore::new(self.max_concurrency);
        let transfers = grants
            .iter()
            .zip(files)
            .enumerate()
            .map(|(index, (grant, file))| {
                let semaphore = &semaphore;
                async move {
                    // Never closed, so a permit is always granted.
                    let _permit = semaphore.acquire().await.ok();
                    self.upload_one(backend, index, grant, file, tracker).await
                }
            });

        join_all(transfers).await.into_iter().collect()
    }

    async fn upload_one<B: UploadBackend>(
        &self,
        backend: &B,
        index: usize,
        grant: &PresignedGrant,
        file: &LocalFile,
        tracker: &ProgressTracker,
    ) -> Result<UploadedFile, ClientError> {
        tracker.start(index);

        let total = file.size();
        let board = tracker.clone();
        let on_progress: ProgressFn = Arc::new(move |sent| board.advance(index, sent, total));

        let put = backend.put_object(grant, file.data.clone(), on_progress);
        let result = match timeout(self.per_file_timeout, put).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::UploadTimeout {
                file_name: grant.file_name.clone(),
            }),
        };

        match result {
            Ok(()) => {
                tracker.complete(index);
                debug!(file_name = %grant.file_name, bytes = total, "Direct upload finished");
                Ok(grant.to_uploaded())
            }
            Err(e) => {
                tracker.fail(index, e.to_string());
                warn!(file_name = %grant.file_name, error = %e, "Direct upload failed");
                Err(e)
            }
        }
    }
}
