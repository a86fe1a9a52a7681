//! Materialization of lazy results into plain JSON.
//!
//! Both functions take their input by value: a stream can be drained once.
//! Draining a partially consumed stream yields only what remains.

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::path::PathStream;
use crate::shape::{Related, ShapeResult};

/// Pull every remaining value, in order.
pub async fn drain(stream: PathStream) -> Result<Vec<Value>, FetchError> {
    stream.try_collect().await
}

/// Drain every property stream and relation into a nested JSON object.
///
/// Properties become arrays. A first-item relation becomes an object, or
/// `null` when nothing was related; an all-items relation becomes an array of
/// objects. Properties come before relations, each in query order.
pub fn drain_shape(result: ShapeResult) -> BoxFuture<'static, Result<Value, FetchError>> {
    async move {
        let mut object = Map::new();
        for (name, stream) in result.properties {
            object.insert(name, Value::Array(drain(stream).await?));
        }
        for (name, related) in result.related {
            let value = match related {
                Related::First(Some(inner)) => drain_shape(*inner).await?,
                Related::First(None) => Value::Null,
                Related::All(results) => {
                    let mut items = Vec::with_capacity(results.len());
                    for inner in results {
                        items.push(drain_shape(inner).await?);
                    }
                    Value::Array(items)
                }
            };
            object.insert(name, value);
        }
        Ok(Value::Object(object))
    }
    .boxed()
}

impl ShapeResult {
    /// See [`drain_shape`].
    pub async fn into_value(self) -> Result<Value, FetchError> {
        drain_shape(self).await
    }
}

impl PathStream {
    /// See [`drain`].
    pub async fn into_values(self) -> Result<Vec<Value>, FetchError> {
        drain(self).await
    }
}
