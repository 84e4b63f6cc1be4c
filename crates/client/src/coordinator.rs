//! Chooses between the direct and server-mediated upload paths.
//!
//! ```text
//! AttemptDirect ──ok──────────────────────────────► Done(Direct)
//!      │ direct batch error, or transient confirm error
//!      ▼
//! AttemptServerMediated ──ok──────────────────────► Done(ServerMediated)
//!      │ any error
//!      ▼
//! Failed(original direct error)
//! ```
//!
//! Grant issuance errors (quota, auth, not found, signing) end the upload
//! without a fallback.

use std::sync::Arc;

use docket_shared::upload::{DeleteFileResponse, FileDescriptor, UploadResponse};
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::UploadBackend;
use crate::config::ClientConfig;
use crate::direct::DirectUploader;
use crate::error::ClientError;
use crate::file::{LocalFile, batch_size};
use crate::progress::ProgressTracker;

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Skip the direct path and send everything through the server.
    pub force_server_upload: bool,
}

/// Which path stored the files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Presigned PUTs plus confirm.
    Direct,
    /// Multipart through the API server.
    ServerMediated,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Path that succeeded.
    pub mode: UploadMode,
    /// Server reply.
    pub response: UploadResponse,
    /// Direct-path error that triggered the fallback, if any.
    pub fallback_reason: Option<String>,
}

enum Step {
    AttemptDirect,
    AttemptServerMediated { original: Option<ClientError> },
    Done(UploadReport),
    Failed(ClientError),
}

/// Drives one batch through the upload protocol.
pub struct UploadCoordinator<B: UploadBackend> {
    backend: Arc<B>,
    direct: DirectUploader,
    fallback_limit_bytes: u64,
}

impl<B: UploadBackend> UploadCoordinator<B> {
    /// Coordinator using the limits from `config`.
    #[must_use]
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        Self {
            backend,
            direct: DirectUploader::from_config(config),
            fallback_limit_bytes: config.fallback_limit_bytes,
        }
    }

    /// Upload `files` to `target_id`.
    ///
    /// If the direct path fails and the fallback also fails, the direct
    /// error is returned.
    pub async fn upload(
        &self,
        target_id: Uuid,
        files: Vec<LocalFile>,
        options: UploadOptions,
        tracker: &ProgressTracker,
    ) -> Result<UploadReport, ClientError> {
        let mut step = if options.force_server_upload {
            Step::AttemptServerMediated { original: None }
        } else {
            Step::AttemptDirect
        };

        loop {
            step = match step {
                Step::AttemptDirect => self.attempt_direct(target_id, &files, tracker).await,
                Step::AttemptServerMediated { original } => {
                    self.attempt_server(target_id, &files, original, tracker)
                        .await
                }
                Step::Done(report) => return Ok(report),
                Step::Failed(err) => return Err(err),
            };
        }
    }

    async fn attempt_direct(
        &self,
        target_id: Uuid,
        files: &[LocalFile],
        tracker: &ProgressTracker,
    ) -> Step {
        let descriptors: Vec<FileDescriptor> = files.iter().map(LocalFile::descriptor).collect();
        let grants = match self.backend.presign(target_id, &descriptors).await {
            Ok(grants) => grants,
            Err(e) => {
                tracker.fail_unfinished(&e.to_string());
                return Step::Failed(e);
            }
        };

        let uploaded = match self
            .direct
            .upload_all(self.backend.as_ref(), &grants, files, tracker)
            .await
        {
            Ok(uploaded) => uploaded,
            Err(e) => {
                return Step::AttemptServerMediated { original: Some(e) };
            }
        };

        match self.backend.confirm(target_id, uploaded).await {
            Ok(response) => {
                info!(
                    %target_id,
                    files = response.uploaded_files.len(),
                    status = %response.target.status,
                    "Direct upload confirmed"
                );
                Step::Done(UploadReport {
                    mode: UploadMode::Direct,
                    response,
                    fallback_reason: None,
                })
            }
            Err(e) if e.is_transient() => Step::AttemptServerMediated { original: Some(e) },
            Err(e) => Step::Failed(e),
        }
    }

    async fn attempt_server(
        &self,
        target_id: Uuid,
        files: &[LocalFile],
        original: Option<ClientError>,
        tracker: &ProgressTracker,
    ) -> Step {
        if let Some(e) = &original {
            warn!(%target_id, error = %e, "Direct upload failed; retrying through the server");
        }

        match self.server_mediated(target_id, files, tracker).await {
            Ok(response) => Step::Done(UploadReport {
                mode: UploadMode::ServerMediated,
                response,
                fallback_reason: original.map(|e| e.to_string()),
            }),
            Err(fallback_error) => match original {
                Some(original) => {
                    warn!(%target_id, error = %fallback_error, "Server-mediated upload failed");
                    tracker.fail_unfinished(&original.to_string());
                    Step::Failed(original)
                }
                None => Step::Failed(fallback_error),
            },
        }
    }

    async fn server_mediated(
        &self,
        target_id: Uuid,
        files: &[LocalFile],
        tracker: &ProgressTracker,
    ) -> Result<UploadResponse, ClientError> {
        let size = batch_size(files);
        if size > self.fallback_limit_bytes {
            let err = ClientError::PayloadTooLarge {
                size,
                max: self.fallback_limit_bytes,
            };
            tracker.fail_unfinished(&err.to_string());
            return Err(err);
        }

        tracker.start_all();
        match self.backend.server_upload(target_id, files.to_vec()).await {
            Ok(response) => {
                tracker.complete_all();
                info!(
                    %target_id,
                    files = response.uploaded_files.len(),
                    status = %response.target.status,
                    "Server-mediated upload stored"
                );
                Ok(response)
            }
            Err(e) => {
                tracker.fail_unfinished(&e.to_string());
                Err(e)
            }
        }
    }

    /// Detach a file from a target and delete its object.
    pub async fn remove(
        &self,
        target_id: Uuid,
        file_url: &str,
    ) -> Result<DeleteFileResponse, ClientError> {
        self.backend.remove(target_id, file_url).await
    }
}
