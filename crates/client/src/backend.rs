//! The seam between the upload logic and the network.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use docket_shared::upload::{
    DeleteFileResponse, FileDescriptor, PresignedGrant, UploadResponse, UploadedFile,
};
use uuid::Uuid;

use crate::error::ClientError;
use crate::file::LocalFile;

/// Called with the cumulative bytes sent for one file.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Calls the upload protocol needs.
pub trait UploadBackend: Send + Sync {
    /// `POST /targets/{id}/upload/presigned`
    fn presign(
        &self,
        target_id: Uuid,
        files: &[FileDescriptor],
    ) -> impl Future<Output = Result<Vec<PresignedGrant>, ClientError>> + Send;

    /// PUT `data` to the grant's presigned URL.
    fn put_object(
        &self,
        grant: &PresignedGrant,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `POST /targets/{id}/upload/confirm`
    fn confirm(
        &self,
        target_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> impl Future<Output = Result<UploadResponse, ClientError>> + Send;

    /// `POST /targets/{id}/upload` as multipart.
    fn server_upload(
        &self,
        target_id: Uuid,
        files: Vec<LocalFile>,
    ) -> impl Future<Output = Result<UploadResponse, ClientError>> + Send;

    /// `DELETE /targets/{id}/upload`
    fn remove(
        &self,
        target_id: Uuid,
        file_url: &str,
    ) -> impl Future<Output = Result<DeleteFileResponse, ClientError>> + Send;
}
