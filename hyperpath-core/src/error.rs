//! Typed error model for query evaluation.
//!
//! Two failure families exist and they surface at different times:
//!
//! ```text
//! validation  → QueryError::MalformedQuery | QueryError::Parse   (before any fetch)
//! resolution  → FetchError                                       (inside the stream, on pull)
//! ```
//!
//! A missing key or a missing link is not an error. It produces an empty
//! result for that branch.

use thiserror::Error;

/// Failure to resolve a link into a document.
///
/// Surfaced through a [`PathStream`](crate::PathStream) at the point the
/// linked value is first needed. Already-yielded values stay delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not a JSON document.
    #[error("malformed body from {url}: {message}")]
    Decode { url: String, message: String },

    /// A link value could not be used as a URL.
    #[error("invalid link {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// URL (or offending link value) the failure relates to.
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. }
            | Self::InvalidUrl { url, .. } => url,
        }
    }

    pub fn not_found(url: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status: 404,
            body: "not found".to_string(),
        }
    }
}

/// Errors returned by the evaluator entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A path segment, shape or selection is structurally invalid.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// Query text could not be parsed into a selection set.
    #[error("query parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
