//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Domain errors from `docket-core` convert into this type; the API layer
/// renders it as `{ "error": <code>, "message": <text> }`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found, or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document quota on a target would be exceeded.
    #[error(
        "Too many files. Maximum allowed: {max}. Current: {current}, trying to upload: {requested}"
    )]
    QuotaExceeded {
        /// Files already attached.
        current: u32,
        /// Files in this request.
        requested: u32,
        /// The target's document count.
        max: u32,
    },

    /// A confirmed object is missing from storage.
    #[error("Upload not verified: {0}")]
    UploadNotVerified(String),

    /// Request body exceeds the accepted size.
    #[error("Payload too large: {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required subsystem is not configured.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Object storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::QuotaExceeded { .. } | Self::UploadNotVerified(_) => 400,
            Self::PayloadTooLarge { .. } => 413,
            Self::Conflict(_) => 409,
            Self::Unavailable(_) => 503,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::UploadNotVerified(_) => "upload_not_verified",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "service_unavailable",
            Self::Database(_) => "database_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the message may be shown to clients verbatim.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::QuotaExceeded { current: 1, requested: 3, max: 3 }, 400, "quota_exceeded")]
    #[case(AppError::UploadNotVerified(String::new()), 400, "upload_not_verified")]
    #[case(AppError::PayloadTooLarge { size: 2, max: 1 }, 413, "payload_too_large")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Unavailable(String::new()), 503, "service_unavailable")]
    #[case(AppError::Database(String::new()), 500, "database_error")]
    #[case(AppError::Storage(String::new()), 500, "storage_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_quota_message_matches_client_display() {
        let err = AppError::QuotaExceeded {
            current: 1,
            requested: 3,
            max: 3,
        };
        assert_eq!(
            err.to_string(),
            "Too many files. Maximum allowed: 3. Current: 1, trying to upload: 3"
        );
    }

    #[test]
    fn test_client_error_split() {
        assert!(AppError::Validation("x".into()).is_client_error());
        assert!(!AppError::Internal("x".into()).is_client_error());
    }
}
