//! Client configuration.
//!
//! # Example
//!
//! ```ignore
//! // Load from environment variables
//! let config = ClientConfig::from_env()?;
//!
//! // Or build programmatically
//! let config = ClientConfig::default()
//!     .with_base_url("http://localhost:8000")
//!     .with_request_timeout(Duration::from_secs(10));
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::domain::DEFAULT_LIMIT;

pub const ENV_BASE_URL: &str = "TASKDECK_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TASKDECK_TIMEOUT_SECS";
pub const ENV_PAGE_LIMIT: &str = "TASKDECK_PAGE_LIMIT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidBaseUrl { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// ClientConfig は API クライアントの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API のオリジン（`/api/v1` はクライアントが付ける）
    pub base_url: String,

    /// 1 リクエストあたりの上限時間
    pub request_timeout: Duration,

    /// 一覧の既定件数（clear 時もこの値に戻る）
    pub page_limit: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(30),
            page_limit: DEFAULT_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// - `TASKDECK_BASE_URL` (default `http://localhost:8000`)
    /// - `TASKDECK_TIMEOUT_SECS` (default 30)
    /// - `TASKDECK_PAGE_LIMIT` (default 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BASE_URL) {
            let trimmed = value.trim().trim_end_matches('/');
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(ConfigError::InvalidBaseUrl {
                    var: ENV_BASE_URL,
                    value,
                });
            }
            config.base_url = trimmed.to_string();
        }

        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_TIMEOUT_SECS, &value)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup(ENV_PAGE_LIMIT) {
            config.page_limit = parse_positive(ENV_PAGE_LIMIT, &value)?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_limit(mut self, limit: u64) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// `/api/v1` 付きの URL
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}
