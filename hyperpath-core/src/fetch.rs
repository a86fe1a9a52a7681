//! Fetcher trait, the sole boundary between the evaluator and the transport.
//!
//! The evaluator issues GET-only fetches through this trait. Headers, auth and
//! retry policy belong to implementations (or wrappers around them), never to
//! the evaluator.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::FetchError;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the document at `url`.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// In-process fetcher backed by a URL → response table.
///
/// Every request is recorded in order, so callers can assert how many fetches
/// an evaluation performed and in which order. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, Result<Value, FetchError>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` at `url`.
    pub fn with(mut self, url: impl Into<String>, document: Value) -> Self {
        self.routes.insert(url.into(), Ok(document));
        self
    }

    /// Fail every fetch of `url` with `error`.
    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.routes.insert(url.into(), Err(error));
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.log().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log().len()
    }

    fn log(&self) -> MutexGuard<'_, Vec<String>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.log().push(url.to_string());
        match self.routes.get(url) {
            Some(response) => response.clone(),
            None => Err(FetchError::not_found(url)),
        }
    }
}
