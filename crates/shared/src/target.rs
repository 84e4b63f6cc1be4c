//! Target and file record types shared by server and client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// Waiting for documents.
    #[default]
    Pending,
    /// Document quota reached.
    Completed,
}

impl TargetStatus {
    /// Database/string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            // Older records used "submitted" for the same terminal state.
            "completed" | "submitted" => Ok(Self::Completed),
            other => Err(format!("unknown target status: {other}")),
        }
    }
}

/// A document attached to a target. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Original file name.
    pub file_name: String,
    /// Public URL of the stored object.
    pub file_url: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// When the record was committed.
    pub uploaded_at: DateTime<Utc>,
}

/// A unit of work with a document quota and due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Target ID.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Labels.
    pub tags: Vec<String>,
    /// When the target was assigned.
    pub assigned_date: DateTime<Utc>,
    /// Due date.
    pub target_date: DateTime<Utc>,
    /// Number of documents required for completion.
    pub document_count: u32,
    /// Current status.
    pub status: TargetStatus,
    /// Optional grade.
    pub score: Option<i32>,
    /// Owning user.
    pub assigned_to: Uuid,
    /// Attached documents, oldest first.
    pub files: Vec<FileRecord>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Target {
    /// Number of attached files.
    #[must_use]
    pub fn file_count(&self) -> u32 {
        u32::try_from(self.files.len()).unwrap_or(u32::MAX)
    }

    /// Whether a file with this URL is already attached.
    #[must_use]
    pub fn has_file(&self, file_url: &str) -> bool {
        self.files.iter().any(|f| f.file_url == file_url)
    }
}

/// Create target payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetRequest {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Assignment date.
    pub assigned_date: DateTime<Utc>,
    /// Due date.
    pub target_date: DateTime<Utc>,
    /// Required document count.
    pub document_count: u32,
    /// Assignee; defaults to the caller.
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

/// Partial update payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// New assignment date.
    pub assigned_date: Option<DateTime<Utc>>,
    /// New due date.
    pub target_date: Option<DateTime<Utc>>,
    /// New required document count.
    pub document_count: Option<u32>,
    /// New status.
    pub status: Option<TargetStatus>,
    /// New score.
    pub score: Option<i32>,
}

/// Query for `GET /targets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetListQuery {
    /// Only targets in this status.
    pub status: Option<TargetStatus>,
}
