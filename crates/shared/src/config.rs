//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload protocol limits.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    86_400 // 1 day
}

/// Which object storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// S3-compatible storage (DigitalOcean Spaces, R2, AWS S3).
    S3,
    /// Local filesystem. Presigning is unavailable, so clients fall back to
    /// server-mediated uploads.
    #[default]
    Local,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend selector.
    #[serde(default)]
    pub provider: StorageKind,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Root directory for the local backend.
    #[serde(default = "default_root")]
    pub root: String,
    /// Public base URL objects are addressed by (a CDN or the bucket host).
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Presigned PUT validity in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_upload_ttl_secs: u64,
    /// Presigned GET validity in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_download_ttl_secs: u64,
    /// Stat each object before persisting a confirmed upload.
    #[serde(default = "default_true")]
    pub verify_uploads: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageKind::default(),
            endpoint: String::new(),
            bucket: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            root: default_root(),
            public_base_url: None,
            presign_upload_ttl_secs: default_presign_ttl(),
            presign_download_ttl_secs: default_presign_ttl(),
            verify_uploads: true,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_root() -> String {
    "./storage".to_string()
}

fn default_presign_ttl() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

/// Limits for the server-mediated upload path.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Largest accepted multipart payload in bytes.
    #[serde(default = "default_max_server_upload")]
    pub max_server_upload_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_server_upload_bytes: default_max_server_upload(),
        }
    }
}

/// 50 MiB.
pub const DEFAULT_MAX_SERVER_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

fn default_max_server_upload() -> u64 {
    DEFAULT_MAX_SERVER_UPLOAD_BYTES
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DOCKET").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
