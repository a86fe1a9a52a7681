//! Client configuration
//!
//! Resolution order for each setting:
//! 1. Explicit builder call (or command-line flag)
//! 2. Environment variable
//! 3. Default

use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

pub const ENV_BASE_URL: &str = "HYPERPATH_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "HYPERPATH_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "HYPERPATH_USER_AGENT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base against which relative link URLs (`/customers/1`) are resolved.
    pub base_url: Option<Url>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from `HYPERPATH_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set but invalid ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = Some(
                Url::parse(raw.trim())
                    .with_context(|| format!("{ENV_BASE_URL} is not a valid URL: {raw}"))?,
            );
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be whole seconds: {raw}"))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn default_user_agent() -> String {
    format!("hyperpath/{}", env!("CARGO_PKG_VERSION"))
}
