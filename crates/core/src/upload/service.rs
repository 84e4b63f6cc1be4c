//! Server half of the upload protocol.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use docket_shared::upload::{FileDescriptor, PresignedGrant, UploadedFile};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::UploadError;
use super::key::{derive_key, is_owned_key};
use crate::storage::{ObjectAttributes, ObjectStore, PresignedUrl};
use crate::target::{AppendOutcome, Target, TargetRepository, check_quota};

/// One part of a server-mediated upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// File bytes.
    pub data: Bytes,
}

impl IncomingFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Issues grants, confirms direct uploads, accepts server-mediated uploads
/// and removes files.
pub struct UploadService<R: TargetRepository, S: ObjectStore> {
    store: Arc<S>,
    repo: Arc<R>,
    max_server_upload_bytes: u64,
}

impl<R: TargetRepository, S: ObjectStore> UploadService<R, S> {
    /// Create a new upload service.
    #[must_use]
    pub fn new(store: Arc<S>, repo: Arc<R>, max_server_upload_bytes: u64) -> Self {
        Self {
            store,
            repo,
            max_server_upload_bytes,
        }
    }

    /// Ceiling for [`Self::upload_via_server`].
    #[must_use]
    pub const fn max_server_upload_bytes(&self) -> u64 {
        self.max_server_upload_bytes
    }

    async fn owned_target(&self, target_id: Uuid, owner: Uuid) -> Result<Target, UploadError> {
        self.repo
            .find_owned(target_id, owner)
            .await?
            .ok_or(UploadError::TargetNotFound(target_id))
    }

    /// Issue one presigned PUT per descriptor, in request order.
    ///
    /// Nothing is written to the database. If any file cannot be signed the
    /// whole batch fails.
    pub async fn issue_grants(
        &self,
        target_id: Uuid,
        owner: Uuid,
        files: &[FileDescriptor],
    ) -> Result<Vec<PresignedGrant>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::validation("No files provided"));
        }
        if let Some(f) = files.iter().find(|f| f.file_name.trim().is_empty()) {
            return Err(UploadError::validation(format!(
                "fileName is required (fileType {})",
                f.file_type
            )));
        }

        let target = self.owned_target(target_id, owner).await?;
        check_quota(target.file_count(), files.len(), target.document_count)?;

        let mut grants = Vec::with_capacity(files.len());
        for file in files {
            let key = derive_key(owner, Utc::now().timestamp_millis(), &file.file_name);
            let presigned = self
                .store
                .presign_upload(&key, &file.file_type)
                .await
                .map_err(|e| UploadError::StorageSigning {
                    file_name: file.file_name.clone(),
                    reason: e.to_string(),
                })?;

            grants.push(PresignedGrant {
                file_url: self.store.file_url(&key),
                key,
                presigned_url: presigned.url,
                file_name: file.file_name.clone(),
                file_type: file.file_type.clone(),
                file_size: file.file_size,
                expires_at: presigned.expires_at,
            });
        }

        debug!(%target_id, count = grants.len(), "Issued upload grants");
        Ok(grants)
    }

    /// Record files the client uploaded directly.
    ///
    /// Each URL must point into the caller's key space. When the store is
    /// configured to verify, every object is stat'ed before anything is
    /// recorded. Already attached URLs are skipped.
    pub async fn confirm(
        &self,
        target_id: Uuid,
        owner: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<AppendOutcome, UploadError> {
        if files.is_empty() {
            return Err(UploadError::validation("No uploaded files provided"));
        }
        self.owned_target(target_id, owner).await?;

        for file in &files {
            let key = self
                .store
                .key_from_url(&file.file_url)
                .filter(|k| is_owned_key(k, owner))
                .ok_or_else(|| {
                    UploadError::validation(format!(
                        "fileUrl {} was not issued for this account",
                        file.file_url
                    ))
                })?;

            if self.store.verifies_uploads() {
                match self.store.stat(&key).await {
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {
                        return Err(UploadError::UploadNotVerified {
                            file_url: file.file_url.clone(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(self.repo.append_files(target_id, owner, files).await?)
    }

    /// Write files through the server and record them in one call.
    ///
    /// The quota is checked before any bytes are written. Objects written
    /// before a failure are deleted again.
    pub async fn upload_via_server(
        &self,
        target_id: Uuid,
        owner: Uuid,
        files: Vec<IncomingFile>,
    ) -> Result<AppendOutcome, UploadError> {
        if files.is_empty() {
            return Err(UploadError::validation("No files provided"));
        }
        let size = files
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.size()));
        if size > self.max_server_upload_bytes {
            return Err(UploadError::PayloadTooLarge {
                size,
                max: self.max_server_upload_bytes,
            });
        }

        let target = self.owned_target(target_id, owner).await?;
        check_quota(target.file_count(), files.len(), target.document_count)?;

        let mut written: Vec<String> = Vec::with_capacity(files.len());
        let mut records = Vec::with_capacity(files.len());
        for file in files {
            let key = derive_key(owner, Utc::now().timestamp_millis(), &file.file_name);
            let file_size = file.size();
            let attributes = ObjectAttributes::typed(file.file_type.clone())
                .with_meta("uploaded-by", owner.to_string())
                .with_meta("original-name", ascii_only(&file.file_name));
            if let Err(e) = self.store.write(&key, attributes, file.data).await {
                self.discard(&written).await;
                return Err(e.into());
            }
            records.push(UploadedFile {
                file_name: file.file_name,
                file_url: self.store.file_url(&key),
                file_type: file.file_type,
                file_size,
            });
            written.push(key);
        }

        match self.repo.append_files(target_id, owner, records).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.discard(&written).await;
                Err(e.into())
            }
        }
    }

    /// Detach a file and delete its object.
    ///
    /// The object delete is best-effort: failures are logged and the record
    /// is still removed. The target's status is left as is.
    pub async fn remove_file(
        &self,
        target_id: Uuid,
        owner: Uuid,
        file_url: &str,
    ) -> Result<Target, UploadError> {
        if file_url.trim().is_empty() {
            return Err(UploadError::validation("fileUrl is required"));
        }
        let key = self
            .store
            .key_from_url(file_url)
            .ok_or_else(|| UploadError::validation("fileUrl is not in this store"))?;

        let target = self.owned_target(target_id, owner).await?;
        if !target.has_file(file_url) {
            return Err(UploadError::FileNotFound(file_url.to_string()));
        }

        if let Err(e) = self.store.delete(&key).await {
            if !e.is_not_found() {
                warn!(%target_id, %key, error = %e, "Failed to delete object; removing record anyway");
            }
        }

        Ok(self
            .repo
            .remove_file(target_id, owner, file_url.to_string())
            .await?)
    }

    /// Presigned GET for one of the caller's objects.
    pub async fn presign_download(
        &self,
        owner: Uuid,
        key: &str,
    ) -> Result<PresignedUrl, UploadError> {
        if !is_owned_key(key, owner) {
            return Err(UploadError::FileNotFound(key.to_string()));
        }
        Ok(self.store.presign_download(key).await?)
    }

    /// Best-effort delete of every object attached to `target`.
    pub async fn purge_objects(&self, target: &Target) {
        let keys: Vec<String> = target
            .files
            .iter()
            .filter_map(|f| self.store.key_from_url(&f.file_url))
            .collect();
        self.discard(&keys).await;
    }

    async fn discard(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                warn!(%key, error = %e, "Failed to clean up object");
            }
        }
    }
}

/// Object metadata travels as HTTP headers, so non-ASCII becomes `_`.
fn ascii_only(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect()
}
