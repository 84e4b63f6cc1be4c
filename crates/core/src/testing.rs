//! In-memory doubles for the repository and object store seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::{Duration, Utc};
use docket_shared::upload::UploadedFile;
use uuid::Uuid;

use crate::storage::{ObjectAttributes, ObjectMetadata, ObjectStore, PresignedUrl, StorageError};
use crate::target::{
    AppendOutcome, FileRecord, NewTarget, Target, TargetError, TargetRepository, TargetStatus,
    UpdateTargetRequest, check_document_count, plan_append, settled_status,
};

/// Mock repository for testing.
pub struct MockTargetRepository {
    targets: Mutex<HashMap<Uuid, Target>>,
    users: Mutex<HashSet<Uuid>>,
}

impl MockTargetRepository {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
            users: Mutex::new(HashSet::new()),
        }
    }

    pub fn add_user(&self, id: Uuid) {
        self.users.lock().unwrap().insert(id);
    }

    /// Insert an empty pending target.
    pub fn seed(&self, owner: Uuid, document_count: u32) -> Target {
        let now = Utc::now();
        let target = Target {
            id: Uuid::new_v4(),
            title: "Seeded".into(),
            description: "seeded target".into(),
            tags: vec![],
            assigned_date: now,
            target_date: now + Duration::days(3),
            document_count,
            status: TargetStatus::Pending,
            score: None,
            assigned_to: owner,
            files: vec![],
            created_at: now,
            updated_at: now,
        };
        self.targets
            .lock()
            .unwrap()
            .insert(target.id, target.clone());
        target
    }

    pub fn get(&self, id: Uuid) -> Target {
        self.targets.lock().unwrap()[&id].clone()
    }

    /// Attach records directly, bypassing quota rules.
    pub fn attach_urls(&self, id: Uuid, urls: &[&str]) {
        let mut targets = self.targets.lock().unwrap();
        let target = targets.get_mut(&id).unwrap();
        for url in urls {
            target.files.push(FileRecord {
                file_name: "seeded.pdf".into(),
                file_url: (*url).into(),
                file_type: "application/pdf".into(),
                file_size: 1,
                uploaded_at: Utc::now(),
            });
        }
    }

    fn owned(targets: &HashMap<Uuid, Target>, id: Uuid, owner: Uuid) -> Option<&Target> {
        targets.get(&id).filter(|t| t.assigned_to == owner)
    }
}

impl TargetRepository for MockTargetRepository {
    async fn create(&self, input: NewTarget) -> Result<Target, TargetError> {
        let now = Utc::now();
        let target = Target {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            tags: input.tags,
            assigned_date: input.assigned_date,
            target_date: input.target_date,
            document_count: input.document_count,
            status: TargetStatus::Pending,
            score: None,
            assigned_to: input.assigned_to,
            files: vec![],
            created_at: now,
            updated_at: now,
        };
        self.targets
            .lock()
            .unwrap()
            .insert(target.id, target.clone());
        Ok(target)
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Target>, TargetError> {
        let targets = self.targets.lock().unwrap();
        Ok(Self::owned(&targets, id, owner).cloned())
    }

    async fn list_owned(
        &self,
        owner: Uuid,
        status: Option<TargetStatus>,
    ) -> Result<Vec<Target>, TargetError> {
        let mut list: Vec<Target> = self
            .targets
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.assigned_to == owner && status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: UpdateTargetRequest,
    ) -> Result<Option<Target>, TargetError> {
        let mut targets = self.targets.lock().unwrap();
        let Some(target) = targets.get_mut(&id).filter(|t| t.assigned_to == owner) else {
            return Ok(None);
        };
        if let Some(count) = patch.document_count {
            check_document_count(target.file_count(), count)?;
        }
        if let Some(v) = patch.title {
            target.title = v;
        }
        if let Some(v) = patch.description {
            target.description = v;
        }
        if let Some(v) = patch.tags {
            target.tags = v;
        }
        if let Some(v) = patch.assigned_date {
            target.assigned_date = v;
        }
        if let Some(v) = patch.target_date {
            target.target_date = v;
        }
        if let Some(v) = patch.document_count {
            target.document_count = v;
        }
        if let Some(v) = patch.status {
            target.status = v;
        }
        if patch.score.is_some() {
            target.score = patch.score;
        }
        target.status = settled_status(target.status, target.file_count(), target.document_count);
        target.updated_at = Utc::now();
        Ok(Some(target.clone()))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Option<Target>, TargetError> {
        let mut targets = self.targets.lock().unwrap();
        if Self::owned(&targets, id, owner).is_none() {
            return Ok(None);
        }
        Ok(targets.remove(&id))
    }

    async fn append_files(
        &self,
        id: Uuid,
        owner: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<AppendOutcome, TargetError> {
        // The mutex plays the role of the row lock.
        let mut targets = self.targets.lock().unwrap();
        let target = targets
            .get_mut(&id)
            .filter(|t| t.assigned_to == owner)
            .ok_or(TargetError::NotFound(id))?;

        let fresh = plan_append(target, &files)?;
        let now = Utc::now();
        let appended: Vec<FileRecord> = fresh
            .into_iter()
            .map(|f| FileRecord {
                file_name: f.file_name,
                file_url: f.file_url,
                file_type: f.file_type,
                file_size: f.file_size,
                uploaded_at: now,
            })
            .collect();
        target.files.extend(appended.iter().cloned());
        if !appended.is_empty() {
            target.status =
                settled_status(target.status, target.file_count(), target.document_count);
            target.updated_at = now;
        }

        Ok(AppendOutcome {
            target: target.clone(),
            appended,
        })
    }

    async fn remove_file(
        &self,
        id: Uuid,
        owner: Uuid,
        file_url: String,
    ) -> Result<Target, TargetError> {
        let mut targets = self.targets.lock().unwrap();
        let target = targets
            .get_mut(&id)
            .filter(|t| t.assigned_to == owner)
            .ok_or(TargetError::NotFound(id))?;
        let before = target.files.len();
        target.files.retain(|f| f.file_url != file_url);
        if target.files.len() == before {
            return Err(TargetError::FileNotFound(file_url));
        }
        Ok(target.clone())
    }

    async fn user_is_active(&self, user_id: Uuid) -> Result<bool, TargetError> {
        Ok(self.users.lock().unwrap().contains(&user_id))
    }
}

/// Object store double keyed by storage key.
pub struct MemoryStore {
    base: String,
    objects: Mutex<HashMap<String, u64>>,
    attributes: Mutex<HashMap<String, ObjectAttributes>>,
    verify: AtomicBool,
    fail_presign: Mutex<Option<String>>,
    fail_write: Mutex<Option<String>>,
    fail_deletes: AtomicBool,
    presign_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            objects: Mutex::new(HashMap::new()),
            attributes: Mutex::new(HashMap::new()),
            verify: AtomicBool::new(true),
            fail_presign: Mutex::new(None),
            fail_write: Mutex::new(None),
            fail_deletes: AtomicBool::new(false),
            presign_calls: AtomicUsize::new(0),
        }
    }

    /// Simulate a client PUT landing.
    pub fn put(&self, key: &str, size: u64) {
        self.objects.lock().unwrap().insert(key.to_string(), size);
    }

    /// Attributes of every object written through `write`.
    pub fn written_attributes(&self) -> Vec<ObjectAttributes> {
        self.attributes.lock().unwrap().values().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    pub fn set_verify(&self, verify: bool) {
        self.verify.store(verify, Ordering::SeqCst);
    }

    /// Fail signing for keys ending in `-{file_name}`.
    pub fn fail_presign_for(&self, file_name: &str) {
        *self.fail_presign.lock().unwrap() = Some(format!("-{file_name}"));
    }

    /// Fail writes for keys ending in `-{file_name}`.
    pub fn fail_write_for(&self, file_name: &str) {
        *self.fail_write.lock().unwrap() = Some(format!("-{file_name}"));
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    fn matches(slot: &Mutex<Option<String>>, key: &str) -> bool {
        slot.lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| key.ends_with(suffix))
    }
}

impl ObjectStore for MemoryStore {
    fn file_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base)?
            .strip_prefix('/')
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    fn verifies_uploads(&self) -> bool {
        self.verify.load(Ordering::SeqCst)
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<PresignedUrl, StorageError> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        if Self::matches(&self.fail_presign, key) {
            return Err(StorageError::operation("signing key unavailable"));
        }
        Ok(PresignedUrl {
            url: format!("https://storage.test/{key}?sig=put"),
            method: "PUT".into(),
            expires_at: Utc::now() + Duration::hours(1),
            headers: HashMap::from([("Content-Type".to_string(), content_type.to_string())]),
        })
    }

    async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        Ok(PresignedUrl {
            url: format!("https://storage.test/{key}?sig=get"),
            method: "GET".into(),
            expires_at: Utc::now() + Duration::hours(1),
            headers: HashMap::new(),
        })
    }

    async fn write(
        &self,
        key: &str,
        attributes: ObjectAttributes,
        data: Bytes,
    ) -> Result<(), StorageError> {
        if Self::matches(&self.fail_write, key) {
            return Err(StorageError::operation("disk full"));
        }
        self.attributes
            .lock()
            .unwrap()
            .insert(key.to_string(), attributes);
        self.put(key, data.len() as u64);
        Ok(())
    }

    async fn stat(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let size = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .ok_or_else(|| StorageError::not_found(key))?;
        Ok(ObjectMetadata {
            key: key.to_string(),
            size,
            content_type: None,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::operation("permission denied"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
