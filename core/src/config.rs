//! Client configuration.
//!
//! Deserializable from any serde source, or read from the environment with
//! [`ClientConfig::from_env`].

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/1.0/kb";

/// Connection settings for the billing API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Headers sent with every request (API key, tenant secret, ...).
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read `BILLING_URL`, `BILLING_TIMEOUT_SECS` and
    /// `BILLING_CONNECT_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BILLING_URL") {
            config.base_url = url;
        }
        if let Some(secs) = env_secs("BILLING_TIMEOUT_SECS")? {
            config.timeout_secs = secs;
        }
        if let Some(secs) = env_secs("BILLING_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Rejects an empty base URL, `timeout_secs` outside 1-300 and
    /// `connect_timeout_secs` outside 1-60.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ApiError::Config(
                "timeout_secs must be between 1 and 300".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(ApiError::Config(
                "connect_timeout_secs must be between 1 and 60".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn env_secs(name: &str) -> Result<Option<u64>, ApiError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ApiError::Config(format!("{name} must be a whole number of seconds"))),
        Err(_) => Ok(None),
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}
