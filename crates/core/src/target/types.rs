//! Target domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use docket_shared::target::{FileRecord, Target, TargetStatus, UpdateTargetRequest};

/// Input for creating a target.
#[derive(Debug, Clone)]
pub struct NewTarget {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Labels.
    pub tags: Vec<String>,
    /// Assignment date.
    pub assigned_date: DateTime<Utc>,
    /// Due date.
    pub target_date: DateTime<Utc>,
    /// Required document count.
    pub document_count: u32,
    /// Owner.
    pub assigned_to: Uuid,
}

/// Result of attaching files to a target.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    /// Target after the append, including its new status.
    pub target: Target,
    /// Records created by this call. Duplicates of already attached URLs
    /// are skipped and do not appear here.
    pub appended: Vec<FileRecord>,
}
