//! hyperpath-core: lazy queries over linked, paginated JSON documents
//!
//! A document may say that a value lives elsewhere (`order_url`), or that a
//! value is a collection whose items are inline (`$item`) or linked
//! (`$item_url`) and continue on a next page (`next_url`). This crate resolves
//! path and shape queries against such documents without the caller ever
//! fetching a resource by hand:
//!
//! - Conventions for links, collections and latest overrides
//! - `Fetcher` trait, the only boundary to the transport
//! - `PathStream`, a pull-driven state machine yielding leaf values
//! - Shapes (`{properties, related}`) and their lazy results
//! - Selection-text parser and translator into shapes
//! - Materialization of lazy results into plain JSON
//!
//! The HTTP fetcher and command-line front end live in `hyperpath-client`.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), hyperpath_core::QueryError> {
//! use hyperpath_core::{drain_shape, Evaluator, MemoryFetcher};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let fetcher = MemoryFetcher::new().with("/orders/1", json!({"order_number": "1000"}));
//! let evaluator = Evaluator::new(Arc::new(fetcher));
//!
//! let customer = json!({"name": "Jane Doe", "order_url": "/orders/1"});
//! let result = evaluator
//!     .query_document(&customer, "{ name order { order_number } }")
//!     .await?;
//! let value = drain_shape(result).await?;
//! assert_eq!(value, json!({"name": ["Jane Doe"], "order": {"order_number": ["1000"]}}));
//! # Ok(())
//! # }
//! ```

pub mod conventions;
pub mod error;
pub mod eval;
pub mod fetch;
pub mod materialize;
pub mod parser;
pub mod path;
pub mod selection;
pub mod shape;

// Re-export commonly used types
pub use error::{FetchError, QueryError};
pub use eval::{EvalOptions, Evaluator, RelatedMode};
pub use fetch::{Fetcher, MemoryFetcher};
pub use materialize::{drain, drain_shape};
pub use parser::parse_query;
pub use path::PathStream;
pub use selection::{
    translate, translate_selection_set, OperationDefinition, QueryDocument, Selection,
    SelectionSet,
};
pub use shape::{Related, Shape, ShapeResult};
