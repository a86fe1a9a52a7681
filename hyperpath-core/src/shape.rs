//! Query shapes and their lazy results
//!
//! A shape names the properties to extract from a document and the relations
//! to recurse into:
//!
//! ```json
//! {
//!   "properties": ["customer_number"],
//!   "related": { "order": { "properties": ["order_number", "total"] } }
//! }
//! ```
//!
//! Each property becomes a single-segment [`PathStream`]. Each relation is
//! located with a single-segment path, then the sub-shape is applied to the
//! first related item (or to every item under [`RelatedMode::All`]).

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::eval::{Evaluator, RelatedMode};
use crate::path::PathStream;

/// Declarative query: properties to extract, relations to expand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub related: IndexMap<String, Shape>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    pub fn relate(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.related.insert(name.into(), shape);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.related.is_empty()
    }

    /// Reject empty property or relation names anywhere in the tree.
    pub fn validate(&self) -> Result<()> {
        if self.properties.iter().any(String::is_empty) {
            return Err(QueryError::MalformedQuery(
                "shape contains an empty property name".to_string(),
            ));
        }
        for (name, shape) in &self.related {
            if name.is_empty() {
                return Err(QueryError::MalformedQuery(
                    "shape contains an empty relation name".to_string(),
                ));
            }
            shape.validate()?;
        }
        Ok(())
    }

    /// Fold `other` into this shape, keeping first-seen property order.
    pub fn merge(&mut self, other: Shape) {
        for property in other.properties {
            if !self.properties.contains(&property) {
                self.properties.push(property);
            }
        }
        for (name, shape) in other.related {
            match self.related.get_mut(&name) {
                Some(existing) => existing.merge(shape),
                None => {
                    self.related.insert(name, shape);
                }
            }
        }
    }
}

/// Lazy result mirroring a [`Shape`].
#[derive(Debug)]
pub struct ShapeResult {
    pub properties: IndexMap<String, PathStream>,
    pub related: IndexMap<String, Related>,
}

/// Expanded relation.
#[derive(Debug)]
pub enum Related {
    /// First related item only; `None` when the relation resolved to nothing.
    First(Option<Box<ShapeResult>>),
    /// Every related item, in resolution order.
    All(Vec<ShapeResult>),
}

/// Apply `shape` to `document`. The shape must already be validated.
pub(crate) fn evaluate<'a>(
    evaluator: &'a Evaluator,
    document: &'a Value,
    shape: &'a Shape,
) -> BoxFuture<'a, Result<ShapeResult>> {
    async move {
        let mut properties = IndexMap::with_capacity(shape.properties.len());
        for name in &shape.properties {
            properties.insert(name.clone(), evaluator.segment(document.clone(), name));
        }

        let mut related = IndexMap::with_capacity(shape.related.len());
        for (name, subshape) in &shape.related {
            let items = evaluator.segment(document.clone(), name);
            let expanded = match evaluator.options().related {
                RelatedMode::First => {
                    let first = match items.first().await? {
                        Some(item) => Some(Box::new(evaluate(evaluator, &item, subshape).await?)),
                        None => {
                            debug!(relation = %name, "relation resolved to nothing");
                            None
                        }
                    };
                    Related::First(first)
                }
                RelatedMode::All => {
                    let items: Vec<Value> = items.try_collect().await?;
                    let mut results = Vec::with_capacity(items.len());
                    for item in &items {
                        results.push(evaluate(evaluator, item, subshape).await?);
                    }
                    Related::All(results)
                }
            };
            related.insert(name.clone(), expanded);
        }

        Ok(ShapeResult {
            properties,
            related,
        })
    }
    .boxed()
}
