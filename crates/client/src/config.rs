//! Client configuration.

use std::time::Duration;

/// Default number of concurrent direct PUTs.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default per-file transfer timeout.
pub const DEFAULT_PER_FILE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default ceiling for the server-mediated fallback (50 MiB).
pub const DEFAULT_FALLBACK_LIMIT_BYTES: u64 = 50 * 1024 * 1024;

/// Settings for talking to a Docket server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8080`. The `/api` prefix is
    /// added by the client.
    pub base_url: String,
    /// Bearer token from `POST /api/auth/login`.
    pub token: Option<String>,
    /// Concurrent direct PUTs.
    pub max_concurrency: usize,
    /// Timeout for one file's transfer.
    pub per_file_timeout: Duration,
    /// Largest batch the fallback will send through the server.
    pub fallback_limit_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            per_file_timeout: DEFAULT_PER_FILE_TIMEOUT,
            fallback_limit_bytes: DEFAULT_FALLBACK_LIMIT_BYTES,
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with default limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the concurrency cap (at least 1).
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Sets the per-file timeout.
    #[must_use]
    pub const fn with_per_file_timeout(mut self, timeout: Duration) -> Self {
        self.per_file_timeout = timeout;
        self
    }

    /// Sets the fallback ceiling.
    #[must_use]
    pub const fn with_fallback_limit(mut self, bytes: u64) -> Self {
        self.fallback_limit_bytes = bytes;
        self
    }

    /// Full URL for an API path such as `/targets`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }
}
