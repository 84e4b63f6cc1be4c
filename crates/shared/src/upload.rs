//! Wire types for the upload protocol.
//!
//! The direct path is `presign → PUT to storage → confirm`; the fallback is a
//! single multipart `POST` that the server writes through to storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::target::Target;

/// What a client intends to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

/// Permission to PUT one file directly to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedGrant {
    /// Storage key the object will live under.
    pub key: String,
    /// Signed PUT URL.
    pub presigned_url: String,
    /// Public URL derived from `key`; the confirm step stores exactly this.
    pub file_url: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type; must be sent as `Content-Type` on the PUT.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// When the signed URL stops working.
    pub expires_at: DateTime<Utc>,
}

impl PresignedGrant {
    /// The confirm tuple for this grant once its bytes have landed.
    #[must_use]
    pub fn to_uploaded(&self) -> UploadedFile {
        UploadedFile {
            file_name: self.file_name.clone(),
            file_url: self.file_url.clone(),
            file_type: self.file_type.clone(),
            file_size: self.file_size,
        }
    }
}

/// A file the client reports as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Original file name.
    pub file_name: String,
    /// Public URL of the stored object.
    pub file_url: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

/// `POST /targets/{id}/upload/presigned` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignRequest {
    /// Files to be uploaded.
    pub files: Vec<FileDescriptor>,
}

/// `POST /targets/{id}/upload/presigned` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    /// One grant per requested file, in request order.
    pub presigned_urls: Vec<PresignedGrant>,
    /// Human-readable summary.
    pub message: String,
}

/// `POST /targets/{id}/upload/confirm` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Files whose bytes were uploaded.
    pub uploaded_files: Vec<UploadedFile>,
}

/// Optional `meta` part of the multipart fallback upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMeta {
    /// Per-file metadata, matched to `files` parts by position.
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// Response for confirm and server-mediated uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Human-readable summary.
    pub message: String,
    /// Target after the files were attached.
    pub target: Target,
    /// Records created by this call.
    pub uploaded_files: Vec<crate::target::FileRecord>,
}

/// `DELETE /targets/{id}/upload` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileRequest {
    /// URL of the file to remove.
    pub file_url: String,
}

/// `DELETE /targets/{id}/upload` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    /// Human-readable summary.
    pub message: String,
    /// Target after the file was removed.
    pub target: Target,
}

/// Sum of declared sizes, saturating.
#[must_use]
pub fn total_size(files: &[FileDescriptor]) -> u64 {
    files.iter().fold(0u64, |acc, f| acc.saturating_add(f.file_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presign_request_uses_client_field_names() {
        let req: PresignRequest = serde_json::from_str(
            r#"{"files":[{"fileName":"a.pdf","fileType":"application/pdf","fileSize":10}]}"#,
        )
        .unwrap();
        assert_eq!(req.files[0].file_name, "a.pdf");
        assert_eq!(req.files[0].file_size, 10);
    }

    #[test]
    fn test_grant_to_uploaded_keeps_url() {
        let grant = PresignedGrant {
            key: "targets/u/1-a.pdf".into(),
            presigned_url: "https://s3/signed".into(),
            file_url: "https://cdn/targets/u/1-a.pdf".into(),
            file_name: "a.pdf".into(),
            file_type: "application/pdf".into(),
            file_size: 10,
            expires_at: Utc::now(),
        };
        let uploaded = grant.to_uploaded();
        assert_eq!(uploaded.file_url, grant.file_url);
        assert_eq!(uploaded.file_size, 10);
    }

    #[test]
    fn test_total_size_saturates() {
        let files = vec![
            FileDescriptor {
                file_name: "a".into(),
                file_type: "x".into(),
                file_size: u64::MAX,
            },
            FileDescriptor {
                file_name: "b".into(),
                file_type: "x".into(),
                file_size: 5,
            },
        ];
        assert_eq!(total_size(&files), u64::MAX);
    }
}
