//! Storage configuration types.

use docket_shared::config::{StorageKind, StorageSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: DigitalOcean Spaces, Cloudflare R2, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Bucket region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Public base URL objects are reachable under when none is configured.
    ///
    /// S3 uses path-style addressing against the endpoint.
    #[must_use]
    pub fn default_public_base_url(&self) -> String {
        match self {
            Self::S3 {
                endpoint, bucket, ..
            } => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            Self::LocalFs { root } => format!("file://{}", root.display()),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Base URL that `file_url` prefixes keys with. No trailing slash.
    pub public_base_url: String,
    /// Presigned upload URL TTL in seconds.
    pub presign_upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds.
    pub presign_download_ttl_secs: u64,
    /// Whether confirm stats objects before recording them.
    pub verify_uploads: bool,
}

impl StorageConfig {
    /// Default upload TTL: 1 hour.
    pub const DEFAULT_UPLOAD_TTL: u64 = 3600;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        let public_base_url = provider.default_public_base_url();
        Self {
            provider,
            public_base_url,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            verify_uploads: true,
        }
    }

    /// Build from the `[storage]` config section.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let provider = match settings.provider {
            StorageKind::S3 => StorageProvider::s3(
                &settings.endpoint,
                &settings.bucket,
                &settings.access_key_id,
                &settings.secret_access_key,
                &settings.region,
            ),
            StorageKind::Local => StorageProvider::local_fs(&settings.root),
        };

        let mut config = Self::new(provider)
            .with_upload_ttl(settings.presign_upload_ttl_secs)
            .with_download_ttl(settings.presign_download_ttl_secs)
            .with_verify_uploads(settings.verify_uploads);
        if let Some(base) = settings.public_base_url.as_deref().filter(|b| !b.is_empty()) {
            config = config.with_public_base_url(base);
        }
        config
    }

    /// Set the public base URL (e.g. a CDN host).
    #[must_use]
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Toggle the existence check on confirm.
    #[must_use]
    pub fn with_verify_uploads(mut self, verify: bool) -> Self {
        self.verify_uploads = verify;
        self
    }

    /// Public URL for a storage key.
    #[must_use]
    pub fn file_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }

    /// Inverse of [`Self::file_url`]; `None` for URLs outside this store.
    #[must_use]
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.public_base_url.as_str())?
            .strip_prefix('/')?;
        let key = key.split(['?', '#']).next().unwrap_or_default();
        (!key.is_empty()).then(|| key.to_string())
    }
}
