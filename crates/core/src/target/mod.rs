//! Targets: units of work with a document quota.
//!
//! A target completes when its attached file count reaches
//! `document_count`. [`plan_append`] and [`settled_status`] hold the rules for
//! attaching files so every repository applies them identically.

mod append;
mod error;
mod service;
mod types;

pub use append::{check_document_count, check_quota, plan_append, settled_status};
pub use error::TargetError;
pub use service::{TargetRepository, TargetService};
pub use types::{AppendOutcome, FileRecord, NewTarget, Target, TargetStatus, UpdateTargetRequest};
