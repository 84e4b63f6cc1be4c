//! Client half of the Docket upload protocol.
//!
//! [`UploadCoordinator`] asks the API for presigned grants, PUTs every file
//! straight to object storage through [`DirectUploader`], then confirms.
//! When the direct path fails it retries the whole batch as one multipart
//! request through the API server. [`HttpBackend`] talks to a running
//! server; tests swap in their own [`UploadBackend`].

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod direct;
pub mod error;
pub mod file;
pub mod http;
pub mod progress;

pub use backend::{ProgressFn, UploadBackend};
pub use config::ClientConfig;
pub use coordinator::{UploadCoordinator, UploadMode, UploadOptions, UploadReport};
pub use direct::DirectUploader;
pub use error::ClientError;
pub use file::LocalFile;
pub use http::HttpBackend;
pub use progress::{FileProgress, ProgressTracker, UploadStatus};
