//! Path evaluator
//!
//! Resolves an ordered list of keys against a document and produces the leaf
//! values lazily, following links and collection pages only when the consumer
//! pulls a value that needs them.
//!
//! ## State machine
//!
//! The stream owns a LIFO stack of frames and at most one in-flight fetch:
//!
//! ```text
//! Eval  { value, cursor }   resolve one value at a cursor
//! Items { iter,  cursor }   remaining items of a sequence, one at a time
//! Fetch { url,   resume }   GET url, then Eval the body at `resume`
//! ```
//!
//! Resolution order for a mapping at a cursor with next key `k`:
//!
//! ```text
//! latest mode and `k__latest` present → value of `k__latest`, key consumed
//! included collection                  → `$item` (same path), then next page
//! linked collection                    → `$item` link (same path), then next page
//! path exhausted                       → the mapping itself
//! `k` present                          → value of `k`, key consumed
//! `k` linked                           → fetched body(ies), key consumed
//! otherwise                            → nothing
//! ```
//!
//! Link values are evaluated with an empty path; every leaf they yield is a
//! URL. The cursor counts how many such link levels are open so that a URL
//! produced by a collection of URL lists still resumes at the right place.

use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream, StreamExt};
use futures::{ready, FutureExt};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

use crate::conventions::{
    has_link, is_included_collection, is_linked_collection, latest_key, link_name, ITEM_KEY,
    NEXT_KEY,
};
use crate::error::{FetchError, QueryError};
use crate::fetch::Fetcher;

/// Position of a frame within the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// Number of path segments already consumed.
    depth: usize,
    /// Open link levels; non-zero means the value being resolved is a URL source.
    links: usize,
}

impl Cursor {
    fn root() -> Self {
        Self { depth: 0, links: 0 }
    }

    fn descend(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    fn into_link(self) -> Self {
        Self {
            links: self.links + 1,
            ..self
        }
    }

    fn out_of_link(self) -> Self {
        Self {
            links: self.links - 1,
            ..self
        }
    }

    fn segment(self, path: &[String]) -> Option<&str> {
        if self.links > 0 {
            return None;
        }
        path.get(self.depth).map(String::as_str)
    }
}

enum Frame {
    Eval { value: Value, at: Cursor },
    Items { items: std::vec::IntoIter<Value>, at: Cursor },
    Fetch { url: String, resume: Cursor },
}

struct PendingFetch {
    url: String,
    resume: Cursor,
    future: BoxFuture<'static, Result<Value, FetchError>>,
}

/// Lazy sequence of leaf values produced by evaluating a path.
///
/// Pull-driven: nothing is fetched until the stream is polled, and dropping the
/// stream abandons any in-flight fetch without starting another. After a fault
/// the stream yields the error once and then ends.
#[must_use = "streams do nothing unless polled"]
pub struct PathStream {
    fetcher: Arc<dyn Fetcher>,
    path: Arc<[String]>,
    latest: bool,
    stack: Vec<Frame>,
    pending: Option<PendingFetch>,
    fetches: usize,
}

impl PathStream {
    /// Evaluate `path` against an in-memory document.
    pub(crate) fn new(
        fetcher: Arc<dyn Fetcher>,
        document: Value,
        path: Vec<String>,
        latest: bool,
    ) -> Self {
        Self::with_root(
            fetcher,
            path,
            latest,
            Frame::Eval {
                value: document,
                at: Cursor::root(),
            },
        )
    }

    /// Fetch `url` first, then evaluate `path` against the body.
    pub(crate) fn from_url(
        fetcher: Arc<dyn Fetcher>,
        url: String,
        path: Vec<String>,
        latest: bool,
    ) -> Self {
        Self::with_root(
            fetcher,
            path,
            latest,
            Frame::Fetch {
                url,
                resume: Cursor::root(),
            },
        )
    }

    fn with_root(fetcher: Arc<dyn Fetcher>, path: Vec<String>, latest: bool, root: Frame) -> Self {
        Self {
            fetcher,
            path: path.into(),
            latest,
            stack: vec![root],
            pending: None,
            fetches: 0,
        }
    }

    /// The path this stream resolves.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Number of fetches started so far.
    pub fn fetches_started(&self) -> usize {
        self.fetches
    }

    /// Pull exactly one value, leaving the rest of the sequence unevaluated.
    pub async fn first(mut self) -> Result<Option<Value>, FetchError> {
        self.next().await.transpose()
    }

    /// Advance the machine by one frame. Returns a value when one is produced.
    fn step(&mut self, frame: Frame) -> Option<Result<Value, FetchError>> {
        match frame {
            Frame::Eval { value, at } => self.eval(value, at),
            Frame::Items { mut items, at } => {
                if let Some(item) = items.next() {
                    self.stack.push(Frame::Items { items, at });
                    self.stack.push(Frame::Eval { value: item, at });
                }
                None
            }
            Frame::Fetch { url, resume } => {
                self.start_fetch(url, resume);
                None
            }
        }
    }

    fn eval(&mut self, value: Value, at: Cursor) -> Option<Result<Value, FetchError>> {
        match value {
            Value::Array(items) => {
                self.stack.push(Frame::Items {
                    items: items.into_iter(),
                    at,
                });
                None
            }
            Value::Object(map) => self.eval_mapping(map, at),
            leaf => self.emit(leaf, at),
        }
    }

    fn eval_mapping(
        &mut self,
        mut map: Map<String, Value>,
        at: Cursor,
    ) -> Option<Result<Value, FetchError>> {
        let path = Arc::clone(&self.path);
        let segment = at.segment(&path);

        if let (true, Some(key)) = (self.latest, segment) {
            if let Some(value) = map.remove(&latest_key(key)) {
                trace!(key, "substituting latest value");
                self.stack.push(Frame::Eval {
                    value,
                    at: at.descend(),
                });
                return None;
            }
        }

        if is_included_collection(&map) {
            trace!(depth = at.depth, "included collection");
            self.push_link(&mut map, NEXT_KEY, at);
            if let Some(items) = map.remove(ITEM_KEY) {
                self.stack.push(Frame::Eval { value: items, at });
            }
            return None;
        }

        if is_linked_collection(&map) {
            trace!(depth = at.depth, "linked collection");
            self.push_link(&mut map, NEXT_KEY, at);
            self.push_link(&mut map, ITEM_KEY, at);
            return None;
        }

        let Some(key) = segment else {
            return self.emit(Value::Object(map), at);
        };

        if let Some(value) = map.remove(key) {
            self.stack.push(Frame::Eval {
                value,
                at: at.descend(),
            });
        } else if has_link(&map, key) {
            self.push_link(&mut map, key, at.descend());
        }
        None
    }

    /// Queue resolution of the link for `key`, if `map` carries one.
    ///
    /// The link value itself is evaluated (it may be one URL, a list, or a
    /// collection of URLs); each fetched body resumes at `resume`.
    fn push_link(&mut self, map: &mut Map<String, Value>, key: &str, resume: Cursor) {
        let urls = link_name(map, key).and_then(|name| map.remove(&name));
        if let Some(urls) = urls {
            self.stack.push(Frame::Eval {
                value: urls,
                at: resume.into_link(),
            });
        }
    }

    fn emit(&mut self, value: Value, at: Cursor) -> Option<Result<Value, FetchError>> {
        if at.links == 0 {
            return Some(Ok(value));
        }
        match value {
            Value::String(url) => {
                self.stack.push(Frame::Fetch {
                    url,
                    resume: at.out_of_link(),
                });
                None
            }
            Value::Null => None,
            other => Some(Err(FetchError::InvalidUrl {
                url: other.to_string(),
                reason: "link value is not a string".to_string(),
            })),
        }
    }

    fn start_fetch(&mut self, url: String, resume: Cursor) {
        debug!(%url, "following link");
        let fetcher = Arc::clone(&self.fetcher);
        let target = url.clone();
        let future = async move { fetcher.fetch(&target).await }.boxed();
        self.fetches += 1;
        self.pending = Some(PendingFetch {
            url,
            resume,
            future,
        });
    }

    fn abort(&mut self, err: FetchError) -> FetchError {
        warn!(url = err.url(), error = %err, "path evaluation aborted");
        self.stack.clear();
        self.pending = None;
        err
    }
}

impl Stream for PathStream {
    type Item = Result<Value, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(pending) = this.pending.as_mut() {
                let result = ready!(pending.future.poll_unpin(cx));
                let url = std::mem::take(&mut pending.url);
                let resume = pending.resume;
                this.pending = None;
                match result {
                    Ok(document) => {
                        debug!(%url, "link resolved");
                        this.stack.push(Frame::Eval {
                            value: document,
                            at: resume,
                        });
                    }
                    Err(err) => return Poll::Ready(Some(Err(this.abort(err)))),
                }
            }

            let Some(frame) = this.stack.pop() else {
                return Poll::Ready(None);
            };
            match this.step(frame) {
                Some(Ok(value)) => return Poll::Ready(Some(Ok(value))),
                Some(Err(err)) => return Poll::Ready(Some(Err(this.abort(err)))),
                None => continue,
            }
        }
    }
}

impl FusedStream for PathStream {
    fn is_terminated(&self) -> bool {
        self.stack.is_empty() && self.pending.is_none()
    }
}

impl std::fmt::Debug for PathStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathStream")
            .field("path", &self.path)
            .field("latest", &self.latest)
            .field("frames", &self.stack.len())
            .field("pending", &self.pending.as_ref().map(|p| p.url.as_str()))
            .field("fetches", &self.fetches)
            .finish()
    }
}

/// Reject paths that cannot name a key.
pub(crate) fn validate_path(path: &[String]) -> Result<(), QueryError> {
    match path.iter().position(|segment| segment.is_empty()) {
        Some(index) => Err(QueryError::MalformedQuery(format!(
            "empty path segment at position {index}"
        ))),
        None => Ok(()),
    }
}
