//! HTTP fetcher
//!
//! reqwest-backed [`Fetcher`]. Relative link URLs are resolved against the
//! configured base URL; absolute ones are used as-is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hyperpath_core::{FetchError, Fetcher};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;

/// Characters of an error body kept in `FetchError::Status`.
const ERROR_BODY_EXCERPT: usize = 200;

pub struct HttpFetcher {
    http: Client,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Absolute URL for a link value.
    pub fn resolve(&self, link: &str) -> Result<Url, FetchError> {
        let resolved = match &self.base_url {
            Some(base) => base.join(link),
            None => Url::parse(link),
        };
        resolved.map_err(|e| FetchError::InvalidUrl {
            url: link.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let target = self.resolve(url)?;
        debug!(%target, "GET");

        let response = self
            .http
            .get(target.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: target.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_EXCERPT).collect(),
            });
        }

        response.json().await.map_err(|e| FetchError::Decode {
            url: target.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: Option<&str>) -> HttpFetcher {
        let mut config = ClientConfig::new();
        if let Some(base) = base {
            config = config.with_base_url(Url::parse(base).unwrap());
        }
        HttpFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let fetcher = fetcher(Some("https://api.example.com/v1/"));
        assert_eq!(
            fetcher.resolve("/customers?page=2").unwrap().as_str(),
            "https://api.example.com/customers?page=2"
        );
        assert_eq!(
            fetcher.resolve("orders/1").unwrap().as_str(),
            "https://api.example.com/v1/orders/1"
        );
    }

    #[test]
    fn test_resolve_absolute_ignores_base() {
        let fetcher = fetcher(Some("https://api.example.com/"));
        assert_eq!(
            fetcher.resolve("https://other.example.org/x").unwrap().as_str(),
            "https://other.example.org/x"
        );
    }

    #[test]
    fn test_resolve_relative_without_base_is_invalid() {
        let err = fetcher(None).resolve("/customers").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { ref url, .. } if url == "/customers"));
    }
}
