//! Target error types.

use thiserror::Error;
use uuid::Uuid;

/// Target operation errors.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Target does not exist or is not owned by the caller.
    #[error("target not found: {0}")]
    NotFound(Uuid),

    /// No file with this URL is attached to the target.
    #[error("file not found on target: {0}")]
    FileNotFound(String),

    /// Appending would push the file count past `document_count`.
    #[error("quota exceeded: {current} attached + {requested} requested > {max}")]
    QuotaExceeded {
        /// Files already attached.
        current: u32,
        /// New files in this request.
        requested: u32,
        /// The target's document count.
        max: u32,
    },

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl TargetError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
