//! Evaluator: entry points for path, shape and selection-text queries.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::parser::parse_query;
use crate::path::{validate_path, PathStream};
use crate::selection::translate;
use crate::shape::{self, Shape, ShapeResult};

/// How many related items a shape relation expands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelatedMode {
    /// Expand only the first resolved item; the rest of the relation is never pulled.
    #[default]
    First,
    /// Expand every resolved item, draining the relation.
    All,
}

/// Options controlling evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Prefer a sibling `<key>__latest` over `<key>` at each segment.
    pub latest: bool,
    pub related: RelatedMode,
}

impl EvalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_related(mut self, related: RelatedMode) -> Self {
        self.related = related;
        self
    }
}

/// Evaluates queries against documents, resolving links through a [`Fetcher`].
///
/// Cheap to clone; clones share the fetcher.
#[derive(Clone)]
pub struct Evaluator {
    fetcher: Arc<dyn Fetcher>,
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            options: EvalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Lazily resolve `path` against `document`.
    ///
    /// An empty path yields the document itself, or each of its items when it
    /// is a sequence or collection.
    pub fn eval_path<I, S>(&self, document: Value, path: I) -> Result<PathStream>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = collect_path(path);
        validate_path(&path)?;
        Ok(PathStream::new(
            Arc::clone(&self.fetcher),
            document,
            path,
            self.options.latest,
        ))
    }

    /// Fetch `url`, then lazily resolve `path` against the fetched document.
    ///
    /// Nothing is fetched until the stream is first polled.
    pub fn follow_link<I, S>(&self, url: impl Into<String>, path: I) -> Result<PathStream>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = collect_path(path);
        validate_path(&path)?;
        Ok(PathStream::from_url(
            Arc::clone(&self.fetcher),
            url.into(),
            path,
            self.options.latest,
        ))
    }

    /// Apply `shape` to `document`.
    ///
    /// Relations are resolved eagerly up to the items they expand, which may
    /// fetch. Property streams stay lazy.
    pub async fn eval_shape(&self, document: &Value, shape: &Shape) -> Result<ShapeResult> {
        shape.validate()?;
        shape::evaluate(self, document, shape).await
    }

    /// Fetch `url`, then apply `shape` to the fetched document.
    pub async fn follow_shape(&self, url: &str, shape: &Shape) -> Result<ShapeResult> {
        shape.validate()?;
        debug!(%url, "fetching shape root");
        let document = self.fetcher.fetch(url).await?;
        shape::evaluate(self, &document, shape).await
    }

    /// Parse selection text (`{ name order { order_number } }`) and apply it to `document`.
    pub async fn query_document(&self, document: &Value, query: &str) -> Result<ShapeResult> {
        let shape = translate(&parse_query(query)?)?;
        self.eval_shape(document, &shape).await
    }

    /// Parse selection text and apply it to the document at `url`.
    pub async fn query_url(&self, url: &str, query: &str) -> Result<ShapeResult> {
        let shape = translate(&parse_query(query)?)?;
        self.follow_shape(url, &shape).await
    }

    /// Single-segment stream used by shape evaluation. Names are pre-validated.
    pub(crate) fn segment(&self, document: Value, key: &str) -> PathStream {
        PathStream::new(
            Arc::clone(&self.fetcher),
            document,
            vec![key.to_string()],
            self.options.latest,
        )
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn collect_path<I, S>(path: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    path.into_iter().map(Into::into).collect()
}
