//! Object store errors.

use opendal::ErrorKind;
use thiserror::Error;

/// Failures talking to the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object under `key`.
    #[error("object not found: {key}")]
    NotFound {
        /// Key that was looked up.
        key: String,
    },

    /// The backend cannot sign URLs; clients must upload through the server.
    #[error("{provider} storage cannot issue presigned URLs")]
    PresignNotSupported {
        /// Backend name.
        provider: &'static str,
    },

    /// Bad or missing settings.
    #[error("storage misconfigured: {0}")]
    Configuration(String),

    /// The backend call failed.
    #[error("storage request failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Missing object under `key`.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Settings problem.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Backend failure.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this is a missing-object error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Maps an OpenDAL error raised while working on `key`.
    pub(crate) fn from_opendal(err: &opendal::Error, key: &str) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Operation(err.to_string()),
        }
    }
}
