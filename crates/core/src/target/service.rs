//! Target service implementation.

use std::future::Future;
use std::sync::Arc;

use docket_shared::target::{CreateTargetRequest, TargetListQuery};
use docket_shared::upload::UploadedFile;
use uuid::Uuid;

use super::error::TargetError;
use super::types::{AppendOutcome, NewTarget, Target, TargetStatus, UpdateTargetRequest};

/// Repository trait for target persistence.
///
/// Every lookup is scoped to an owner: a target that exists but belongs to
/// someone else is reported the same as a missing one.
pub trait TargetRepository: Send + Sync {
    /// Insert a new target.
    fn create(
        &self,
        input: NewTarget,
    ) -> impl Future<Output = Result<Target, TargetError>> + Send;

    /// Find a target owned by `owner`, with its files.
    fn find_owned(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> impl Future<Output = Result<Option<Target>, TargetError>> + Send;

    /// List targets owned by `owner`, newest first.
    fn list_owned(
        &self,
        owner: Uuid,
        status: Option<TargetStatus>,
    ) -> impl Future<Output = Result<Vec<Target>, TargetError>> + Send;

    /// Apply a partial update. `None` if not found.
    ///
    /// Implementations must take the same lock as [`Self::append_files`],
    /// apply [`super::check_document_count`] to a new `document_count`, and
    /// store [`super::settled_status`] for the patched target.
    fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: UpdateTargetRequest,
    ) -> impl Future<Output = Result<Option<Target>, TargetError>> + Send;

    /// Delete a target and its file records, returning what was deleted.
    fn delete(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> impl Future<Output = Result<Option<Target>, TargetError>> + Send;

    /// Attach files atomically.
    ///
    /// Implementations must serialize concurrent appends to one target,
    /// apply [`super::plan_append`], and store [`super::settled_status`]
    /// in the same unit of work.
    fn append_files(
        &self,
        id: Uuid,
        owner: Uuid,
        files: Vec<UploadedFile>,
    ) -> impl Future<Output = Result<AppendOutcome, TargetError>> + Send;

    /// Remove the file record with `file_url`.
    fn remove_file(
        &self,
        id: Uuid,
        owner: Uuid,
        file_url: String,
    ) -> impl Future<Output = Result<Target, TargetError>> + Send;

    /// Whether `user_id` names an active user.
    fn user_is_active(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<bool, TargetError>> + Send;
}

/// CRUD operations on targets.
pub struct TargetService<R: TargetRepository> {
    repo: Arc<R>,
}

impl<R: TargetRepository> TargetService<R> {
    /// Create a new target service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Create a target, assigned to `caller` unless the request names
    /// another active user.
    pub async fn create(
        &self,
        caller: Uuid,
        req: CreateTargetRequest,
    ) -> Result<Target, TargetError> {
        require_text("title", &req.title)?;
        require_text("description", &req.description)?;

        let assigned_to = req.assigned_to.unwrap_or(caller);
        if assigned_to != caller && !self.repo.user_is_active(assigned_to).await? {
            return Err(TargetError::validation(format!(
                "assignedTo {assigned_to} is not an active user"
            )));
        }

        self.repo
            .create(NewTarget {
                title: req.title.trim().to_string(),
                description: req.description,
                tags: clean_tags(req.tags),
                assigned_date: req.assigned_date,
                target_date: req.target_date,
                document_count: req.document_count,
                assigned_to,
            })
            .await
    }

    /// List the caller's targets.
    pub async fn list(
        &self,
        owner: Uuid,
        query: TargetListQuery,
    ) -> Result<Vec<Target>, TargetError> {
        self.repo.list_owned(owner, query.status).await
    }

    /// Fetch one of the caller's targets.
    pub async fn get(&self, id: Uuid, owner: Uuid) -> Result<Target, TargetError> {
        self.repo
            .find_owned(id, owner)
            .await?
            .ok_or(TargetError::NotFound(id))
    }

    /// Partially update one of the caller's targets.
    ///
    /// `documentCount` may not drop below the number of attached files, and
    /// lowering it to that number completes the target.
    pub async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        mut patch: UpdateTargetRequest,
    ) -> Result<Target, TargetError> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        patch.tags = patch.tags.map(clean_tags);

        self.repo
            .update(id, owner, patch)
            .await?
            .ok_or(TargetError::NotFound(id))
    }

    /// Delete one of the caller's targets, returning it so stored objects
    /// can be cleaned up.
    pub async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Target, TargetError> {
        self.repo
            .delete(id, owner)
            .await?
            .ok_or(TargetError::NotFound(id))
    }
}

fn require_text(field: &str, value: &str) -> Result<(), TargetError> {
    if value.trim().is_empty() {
        return Err(TargetError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
