//! Quota and de-duplication rules for attaching files to a target.
//!
//! Repositories call [`plan_append`] while holding whatever lock serializes
//! writers on the target, then persist the returned files and store
//! [`settled_status`].

use std::collections::HashSet;

use docket_shared::upload::UploadedFile;

use super::error::TargetError;
use super::types::{Target, TargetStatus};

/// Files from `incoming` that should be inserted.
///
/// URLs already attached, or repeated within `incoming`, are dropped. The
/// remainder must fit in the target's quota.
pub fn plan_append(
    target: &Target,
    incoming: &[UploadedFile],
) -> Result<Vec<UploadedFile>, TargetError> {
    let mut seen: HashSet<&str> = target.files.iter().map(|f| f.file_url.as_str()).collect();

    let fresh: Vec<UploadedFile> = incoming
        .iter()
        .filter(|f| seen.insert(f.file_url.as_str()))
        .cloned()
        .collect();

    if fresh.is_empty() {
        return Ok(fresh);
    }
    check_quota(target.file_count(), fresh.len(), target.document_count)?;
    Ok(fresh)
}

/// Fails with `QuotaExceeded` when `current + requested > max`.
pub fn check_quota(current: u32, requested: usize, max: u32) -> Result<(), TargetError> {
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);
    if current.saturating_add(requested) > max {
        return Err(TargetError::QuotaExceeded {
            current,
            requested,
            max,
        });
    }
    Ok(())
}

/// Fails with `Validation` when `document_count` would drop below the
/// files already attached.
pub fn check_document_count(file_count: u32, document_count: u32) -> Result<(), TargetError> {
    if document_count < file_count {
        return Err(TargetError::validation(format!(
            "documentCount {document_count} is below the {file_count} files already attached"
        )));
    }
    Ok(())
}

/// Status after the file count or the quota changed.
///
/// Reaching the quota completes a target; removing files never reopens it.
#[must_use]
pub fn settled_status(current: TargetStatus, file_count: u32, document_count: u32) -> TargetStatus {
    if file_count > 0 && file_count >= document_count {
        TargetStatus::Completed
    } else {
        current
    }
}
