//! Target repository for database operations.
//!
//! File records are rows in `target_files`. Appends and removals lock the
//! owning `targets` row (`SELECT ... FOR UPDATE`) so concurrent confirms on
//! one target are serialized and the quota check cannot be raced.

use std::collections::HashMap;

use chrono::Utc;
use docket_core::target::{
    AppendOutcome, FileRecord, NewTarget, Target, TargetError,
    TargetRepository as TargetRepoTrait, TargetStatus, UpdateTargetRequest, check_document_count,
    plan_append, settled_status,
};
use docket_shared::upload::UploadedFile;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::TargetStatus as DbTargetStatus, target_files, targets, users,
};

/// Target repository implementation.
#[derive(Debug, Clone)]
pub struct TargetRepository {
    db: DatabaseConnection,
}

impl TargetRepository {
    /// Create a new target repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> TargetError {
    TargetError::repository(e.to_string())
}

async fn load_files<C: ConnectionTrait>(
    conn: &C,
    target_id: Uuid,
) -> Result<Vec<target_files::Model>, TargetError> {
    target_files::Entity::find()
        .filter(target_files::Column::TargetId.eq(target_id))
        .order_by_asc(target_files::Column::UploadedAt)
        .order_by_asc(target_files::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)
}

async fn find_owned_row<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    owner: Uuid,
    lock: bool,
) -> Result<Option<targets::Model>, TargetError> {
    let mut query = targets::Entity::find_by_id(id).filter(targets::Column::AssignedTo.eq(owner));
    if lock {
        query = query.lock_exclusive();
    }
    query.one(conn).await.map_err(db_err)
}

impl TargetRepoTrait for TargetRepository {
    async fn create(&self, input: NewTarget) -> Result<Target, TargetError> {
        let now = Utc::now().into();
        let active_model = targets::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            tags: Set(serde_json::json!(input.tags)),
            assigned_date: Set(input.assigned_date.into()),
            target_date: Set(input.target_date.into()),
            document_count: Set(to_db_count(input.document_count)?),
            status: Set(DbTargetStatus::Pending),
            score: Set(None),
            assigned_to: Set(input.assigned_to),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(db_err)?;
        Ok(to_domain(model, Vec::new()))
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Target>, TargetError> {
        let Some(row) = find_owned_row(&self.db, id, owner, false).await? else {
            return Ok(None);
        };
        let files = load_files(&self.db, id).await?;
        Ok(Some(to_domain(row, files)))
    }

    async fn list_owned(
        &self,
        owner: Uuid,
        status: Option<TargetStatus>,
    ) -> Result<Vec<Target>, TargetError> {
        let mut query = targets::Entity::find().filter(targets::Column::AssignedTo.eq(owner));
        if let Some(status) = status {
            query = query.filter(targets::Column::Status.eq(DbTargetStatus::from(status)));
        }
        let rows = query
            .order_by_desc(targets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut files_by_target: HashMap<Uuid, Vec<target_files::Model>> = HashMap::new();
        if !ids.is_empty() {
            let files = target_files::Entity::find()
                .filter(target_files::Column::TargetId.is_in(ids))
                .order_by_asc(target_files::Column::UploadedAt)
                .order_by_asc(target_files::Column::Id)
                .all(&self.db)
                .await
                .map_err(db_err)?;
            for file in files {
                files_by_target.entry(file.target_id).or_default().push(file);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let files = files_by_target.remove(&row.id).unwrap_or_default();
                to_domain(row, files)
            })
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: UpdateTargetRequest,
    ) -> Result<Option<Target>, TargetError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let Some(row) = find_owned_row(&txn, id, owner, true).await? else {
            return Ok(None);
        };
        let files = load_files(&txn, id).await?;
        let file_count = u32::try_from(files.len()).unwrap_or(u32::MAX);

        let document_count = match patch.document_count {
            Some(count) => {
                check_document_count(file_count, count)?;
                count
            }
            None => from_db_count(row.document_count),
        };
        let requested_status = patch.status.unwrap_or_else(|| row.status.into());
        let status = settled_status(requested_status, file_count, document_count);

        let mut active: targets::ActiveModel = row.into();
        if let Some(title) = patch.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(tags) = patch.tags {
            active.tags = Set(serde_json::json!(tags));
        }
        if let Some(date) = patch.assigned_date {
            active.assigned_date = Set(date.into());
        }
        if let Some(date) = patch.target_date {
            active.target_date = Set(date.into());
        }
        if patch.document_count.is_some() {
            active.document_count = Set(to_db_count(document_count)?);
        }
        if patch.score.is_some() {
            active.score = Set(patch.score);
        }
        active.status = Set(status.into());
        active.updated_at = Set(Utc::now().into());

        let row = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(Some(to_domain(row, files)))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Option<Target>, TargetError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let Some(row) = find_owned_row(&txn, id, owner, true).await? else {
            return Ok(None);
        };
        let files = load_files(&txn, id).await?;

        // target_files rows go with the cascade.
        targets::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(Some(to_domain(row, files)))
    }

    async fn append_files(
        &self,
        id: Uuid,
        owner: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<AppendOutcome, TargetError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let row = find_owned_row(&txn, id, owner, true)
            .await?
            .ok_or(TargetError::NotFound(id))?;
        let existing = load_files(&txn, id).await?;
        let current = to_domain(row.clone(), existing);

        let fresh = plan_append(&current, &files)?;
        if fresh.is_empty() {
            debug!(target_id = %id, offered = files.len(), "Every offered file is already attached");
            txn.commit().await.map_err(db_err)?;
            return Ok(AppendOutcome {
                target: current,
                appended: Vec::new(),
            });
        }

        let uploaded_at = Utc::now();
        let models = fresh
            .iter()
            .map(|f| {
                Ok(target_files::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    target_id: Set(id),
                    file_name: Set(f.file_name.clone()),
                    file_url: Set(f.file_url.clone()),
                    file_type: Set(f.file_type.clone()),
                    file_size: Set(i64::try_from(f.file_size).map_err(|_| {
                        TargetError::validation(format!("fileSize {} out of range", f.file_size))
                    })?),
                    uploaded_at: Set(uploaded_at.into()),
                })
            })
            .collect::<Result<Vec<_>, TargetError>>()?;
        target_files::Entity::insert_many(models)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let added = u32::try_from(fresh.len()).unwrap_or(u32::MAX);
        let count = current.file_count().saturating_add(added);
        let status = settled_status(current.status, count, current.document_count);

        let mut active: targets::ActiveModel = row.into();
        active.status = Set(status.into());
        active.updated_at = Set(uploaded_at.into());
        let row = active.update(&txn).await.map_err(db_err)?;

        let all_files = load_files(&txn, id).await?;
        txn.commit().await.map_err(db_err)?;

        if status != current.status {
            debug!(target_id = %id, files = count, %status, "Target reached its document count");
        }

        let appended = fresh
            .into_iter()
            .map(|f| FileRecord {
                file_name: f.file_name,
                file_url: f.file_url,
                file_type: f.file_type,
                file_size: f.file_size,
                uploaded_at,
            })
            .collect();

        Ok(AppendOutcome {
            target: to_domain(row, all_files),
            appended,
        })
    }

    async fn remove_file(
        &self,
        id: Uuid,
        owner: Uuid,
        file_url: String,
    ) -> Result<Target, TargetError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let row = find_owned_row(&txn, id, owner, true)
            .await?
            .ok_or(TargetError::NotFound(id))?;

        let result = target_files::Entity::delete_many()
            .filter(target_files::Column::TargetId.eq(id))
            .filter(target_files::Column::FileUrl.eq(file_url.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(TargetError::FileNotFound(file_url));
        }

        let mut active: targets::ActiveModel = row.into();
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&txn).await.map_err(db_err)?;

        let files = load_files(&txn, id).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(to_domain(row, files))
    }

    async fn user_is_active(&self, user_id: Uuid) -> Result<bool, TargetError> {
        let count = users::Entity::find_by_id(user_id)
            .filter(users::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

fn to_db_count(count: u32) -> Result<i32, TargetError> {
    i32::try_from(count)
        .map_err(|_| TargetError::validation(format!("documentCount {count} out of range")))
}

fn from_db_count(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}

fn to_domain(row: targets::Model, files: Vec<target_files::Model>) -> Target {
    Target {
        id: row.id,
        title: row.title,
        description: row.description,
        tags: serde_json::from_value(row.tags).unwrap_or_default(),
        assigned_date: row.assigned_date.into(),
        target_date: row.target_date.into(),
        document_count: from_db_count(row.document_count),
        status: row.status.into(),
        score: row.score,
        assigned_to: row.assigned_to,
        files: files.into_iter().map(file_to_domain).collect(),
        created_at: row.created_at.into(),
        updated_at: row.updated_at.into(),
    }
}

fn file_to_domain(file: target_files::Model) -> FileRecord {
    FileRecord {
        file_name: file.file_name,
        file_url: file.file_url,
        file_type: file.file_type,
        file_size: u64::try_from(file.file_size).unwrap_or(0),
        uploaded_at: file.uploaded_at.into(),
    }
}
