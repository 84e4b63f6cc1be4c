//! Upload protocol errors.

use docket_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;
use crate::target::TargetError;

/// Upload operation errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Target does not exist or is not owned by the caller.
    #[error("target not found: {0}")]
    TargetNotFound(Uuid),

    /// No such file on the target, or the key is outside the caller's space.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The request would push the target past its document count.
    #[error("quota exceeded: {current} attached + {requested} requested > {max}")]
    QuotaExceeded {
        /// Files already attached.
        current: u32,
        /// Files in this request.
        requested: u32,
        /// The target's document count.
        max: u32,
    },

    /// Signing a PUT failed; the whole batch is rejected.
    #[error("could not sign upload for {file_name}: {reason}")]
    StorageSigning {
        /// File whose grant failed.
        file_name: String,
        /// Underlying storage error.
        reason: String,
    },

    /// A confirmed file is not present in storage.
    #[error("upload not verified: {file_url} is not in storage")]
    UploadNotVerified {
        /// Reported URL.
        file_url: String,
    },

    /// Server-mediated payload over the configured ceiling.
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Payload size.
        size: u64,
        /// Ceiling.
        max: u64,
    },

    /// Malformed request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Target repository failure.
    #[error(transparent)]
    Target(TargetError),
}

impl UploadError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<TargetError> for UploadError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::NotFound(id) => Self::TargetNotFound(id),
            TargetError::FileNotFound(url) => Self::FileNotFound(url),
            TargetError::QuotaExceeded {
                current,
                requested,
                max,
            } => Self::QuotaExceeded {
                current,
                requested,
                max,
            },
            TargetError::Validation(msg) => Self::Validation(msg),
            other @ TargetError::Repository(_) => Self::Target(other),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TargetNotFound(_) => Self::NotFound("Target not found".to_string()),
            UploadError::FileNotFound(_) => Self::NotFound("File not found".to_string()),
            UploadError::QuotaExceeded {
                current,
                requested,
                max,
            } => Self::QuotaExceeded {
                current,
                requested,
                max,
            },
            UploadError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            UploadError::Validation(msg) => Self::Validation(msg),
            UploadError::UploadNotVerified { file_url } => {
                Self::UploadNotVerified(format!("{file_url} is not in storage"))
            }
            e @ (UploadError::StorageSigning { .. } | UploadError::Storage(_)) => {
                Self::Storage(e.to_string())
            }
            UploadError::Target(e) => e.into(),
        }
    }
}

impl From<TargetError> for AppError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::NotFound(_) => Self::NotFound("Target not found".to_string()),
            TargetError::FileNotFound(_) => Self::NotFound("File not found".to_string()),
            TargetError::QuotaExceeded {
                current,
                requested,
                max,
            } => Self::QuotaExceeded {
                current,
                requested,
                max,
            },
            TargetError::Validation(msg) => Self::Validation(msg),
            TargetError::Repository(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_maps_through_both_layers() {
        let err: UploadError = TargetError::QuotaExceeded {
            current: 2,
            requested: 2,
            max: 3,
        }
        .into();
        assert!(matches!(err, UploadError::QuotaExceeded { max: 3, .. }));

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.error_code(), "quota_exceeded");
    }

    #[test]
    fn test_status_codes() {
        let cases: Vec<(UploadError, u16, &str)> = vec![
            (UploadError::TargetNotFound(Uuid::nil()), 404, "not_found"),
            (UploadError::FileNotFound("x".into()), 404, "not_found"),
            (
                UploadError::PayloadTooLarge { size: 2, max: 1 },
                413,
                "payload_too_large",
            ),
            (UploadError::validation("x"), 400, "validation_error"),
            (
                UploadError::UploadNotVerified {
                    file_url: "u".into(),
                },
                400,
                "upload_not_verified",
            ),
            (
                UploadError::StorageSigning {
                    file_name: "a".into(),
                    reason: "b".into(),
                },
                500,
                "storage_error",
            ),
            (
                UploadError::Target(TargetError::repository("db down")),
                500,
                "database_error",
            ),
        ];
        for (err, status, code) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status_code(), status);
            assert_eq!(app.error_code(), code);
        }
    }
}
