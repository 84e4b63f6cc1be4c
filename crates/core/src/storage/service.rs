//! Storage service implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{Operator, services};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Headers and user metadata written with an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAttributes {
    /// MIME type.
    pub content_type: String,
    /// Provider user metadata (`x-amz-meta-*` on S3). Values must be ASCII.
    pub metadata: Vec<(String, String)>,
}

impl ObjectAttributes {
    /// Attributes with only a content type.
    #[must_use]
    pub fn typed(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            metadata: Vec::new(),
        }
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// What storage knows about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type, if the provider records one.
    pub content_type: Option<String>,
}

/// Object store operations the upload protocol depends on.
///
/// [`StorageService`] is the production implementation.
pub trait ObjectStore: Send + Sync {
    /// Public URL for a key.
    fn file_url(&self, key: &str) -> String;

    /// Key for a public URL produced by [`ObjectStore::file_url`].
    fn key_from_url(&self, url: &str) -> Option<String>;

    /// Whether confirmed uploads should be stat'ed before being recorded.
    fn verifies_uploads(&self) -> bool;

    /// Sign a PUT for `key`.
    fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<PresignedUrl, StorageError>> + Send;

    /// Sign a GET for `key`.
    fn presign_download(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<PresignedUrl, StorageError>> + Send;

    /// Write an object. Attributes the provider cannot store are dropped.
    fn write(
        &self,
        key: &str,
        attributes: ObjectAttributes,
        data: Bytes,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Fetch object metadata.
    fn stat(&self, key: &str)
    -> impl Future<Output = Result<ObjectMetadata, StorageError>> + Send;

    /// Delete an object. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// OpenDAL-backed object storage.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("provider", &self.config.provider.name())
            .field("public_base_url", &self.config.public_base_url)
            .finish_non_exhaustive()
    }
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Whether the backend can sign direct PUT and GET URLs.
    #[must_use]
    pub fn supports_presign(&self) -> bool {
        let capability = self.operator.info().full_capability();
        capability.presign_write && capability.presign_read
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn expiry(ttl_secs: u64) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
    }
}

impl ObjectStore for StorageService {
    fn file_url(&self, key: &str) -> String {
        self.config.file_url(key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        self.config.key_from_url(url)
    }

    fn verifies_uploads(&self) -> bool {
        self.config.verify_uploads
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<PresignedUrl, StorageError> {
        if !self.supports_presign() {
            return Err(StorageError::PresignNotSupported {
                provider: self.provider_name(),
            });
        }
        let ttl = Duration::from_secs(self.config.presign_upload_ttl_secs);

        let presigned = self
            .operator
            .presign_write_with(key, ttl)
            .content_type(content_type)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Self::expiry(self.config.presign_upload_ttl_secs),
            headers,
        })
    }

    async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        if !self.supports_presign() {
            return Err(StorageError::PresignNotSupported {
                provider: self.provider_name(),
            });
        }
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Self::expiry(self.config.presign_download_ttl_secs),
            headers: HashMap::new(),
        })
    }

    async fn write(
        &self,
        key: &str,
        attributes: ObjectAttributes,
        data: Bytes,
    ) -> Result<(), StorageError> {
        let capability = self.operator.info().full_capability();

        let mut write = self.operator.write_with(key, data);
        if capability.write_with_content_type {
            write = write.content_type(&attributes.content_type);
        }
        if capability.write_with_user_metadata && !attributes.metadata.is_empty() {
            write = write.user_metadata(attributes.metadata);
        }
        write
            .await
            .map(|_| ())
            .map_err(|e| StorageError::from_opendal(&e, key))
    }

    async fn stat(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))
    }
}
