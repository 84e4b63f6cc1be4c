//! Server side of the upload protocol.
//!
//! Direct path: [`UploadService::issue_grants`] signs one PUT per file, the
//! client writes straight to storage, then [`UploadService::confirm`]
//! records the files. Fallback path: [`UploadService::upload_via_server`]
//! receives the bytes, writes them itself and records them in one call.
//! Both paths end in the repository's atomic `append_files`.

mod error;
mod key;
mod service;

pub use error::UploadError;
pub use key::{KEY_ROOT, derive_key, is_owned_key, owner_prefix, sanitize_filename};
pub use service::{IncomingFile, UploadService};
