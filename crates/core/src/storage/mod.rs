//! Object storage for target documents using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: DigitalOcean Spaces, Cloudflare R2, AWS S3
//! - Local filesystem (development only; cannot presign)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.presign_read("key", duration)   │
//! │ op.stat("key")             │ op.presign_write("key", duration)  │
//! │ op.delete("key")           │                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys map to public URLs through `public_base_url`; `file_url` and
//! `key_from_url` are exact inverses so the URL a client reports after a
//! direct upload can be traced back to the key it was granted.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ObjectAttributes, ObjectMetadata, ObjectStore, PresignedUrl, StorageService};
