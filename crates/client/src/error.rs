//! Client-side errors.

use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the upload client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing, invalid or expired token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Target or file not found for this user.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target's document quota would be exceeded.
    #[error("Too many files. Maximum allowed: {max}. Current: {current}, trying to upload: {requested}")]
    QuotaExceeded {
        /// Files already attached.
        current: u32,
        /// Files in this request.
        requested: u32,
        /// The target's document count.
        max: u32,
    },

    /// The server could not sign a PUT for the batch.
    #[error("could not obtain upload URLs: {0}")]
    StorageSigning(String),

    /// A file's transfer did not finish within the per-file timeout.
    #[error("upload of {file_name} timed out")]
    UploadTimeout {
        /// File that timed out.
        file_name: String,
    },

    /// Connection-level failure.
    #[error("network error during {operation}: {message}")]
    Network {
        /// What was being attempted.
        operation: String,
        /// Transport error text.
        message: String,
    },

    /// Object storage answered a PUT with a non-2xx status.
    #[error("storage rejected {file_name} with status {status}")]
    StorageRejected {
        /// File that was rejected.
        file_name: String,
        /// HTTP status from storage.
        status: u16,
    },

    /// Batch is larger than the server-mediated ceiling.
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Summed payload size.
        size: u64,
        /// Ceiling.
        max: u64,
    },

    /// Any other non-2xx API reply.
    #[error("API error {status} ({code}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// `error` field of the body.
        code: String,
        /// `message` field of the body.
        message: String,
    },

    /// Local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Transport-level failures, where retrying through another path may
    /// succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::UploadTimeout { .. })
    }

    /// On a presign call, a `storage_error` reply means the server could
    /// not sign the batch.
    #[must_use]
    pub fn for_presign(self) -> Self {
        match self {
            Self::Api { code, message, .. } if code == "storage_error" => {
                Self::StorageSigning(message)
            }
            other => other,
        }
    }

    pub(crate) fn network(operation: &str, err: &reqwest::Error) -> Self {
        Self::Network {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    /// Maps an API error reply to a typed error.
    ///
    /// `body` is the raw response text; non-JSON bodies become the message.
    #[must_use]
    pub fn from_api_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_else(|_| ErrorBody {
            error: String::new(),
            message: body.to_string(),
            ..ErrorBody::default()
        });

        match (status, parsed.error.as_str()) {
            (401, _) => Self::Unauthorized(parsed.message),
            (404, _) => Self::NotFound(parsed.message),
            (_, "quota_exceeded") => Self::QuotaExceeded {
                current: parsed.current.unwrap_or_default(),
                requested: parsed.requested.unwrap_or_default(),
                max: parsed.max.unwrap_or_default(),
            },
            _ => Self::Api {
                status,
                code: parsed.error,
                message: parsed.message,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    current: Option<u32>,
    requested: Option<u32>,
    max: Option<u32>,
}
