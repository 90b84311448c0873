use std::time::Duration;

use crate::error::{DeskError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "CLAIM_API_URL";
pub const TIMEOUT_ENV: &str = "CLAIM_API_TIMEOUT_SECS";

/// Where the classification service lives and how long the transport waits for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Reads `CLAIM_API_URL` and `CLAIM_API_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV) {
            config = config.with_api_url(url)?;
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                DeskError::Config(format!("{TIMEOUT_ENV} must be whole seconds, got `{raw}`"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs))?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeskError::Config(format!(
                "API URL must start with http:// or https://, got `{url}`"
            )));
        }
        self.api_url = url.to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(DeskError::Config("request timeout must be positive".to_string()));
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}
