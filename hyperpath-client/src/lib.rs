//! hyperpath-client: HTTP link resolution for hyperpath queries
//!
//! Wires the reqwest-backed [`HttpFetcher`] into a core [`Evaluator`]:
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use hyperpath_client::{connect, ClientConfig};
//!
//! let evaluator = connect(&ClientConfig::from_env()?)?;
//! let orders = evaluator
//!     .follow_link("https://api.example.com/customers/1", ["order", "order_number"])?
//!     .into_values()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;

use anyhow::Result;
use std::sync::Arc;

pub use config::ClientConfig;
pub use http::HttpFetcher;
pub use hyperpath_core::{
    drain, drain_shape, EvalOptions, Evaluator, FetchError, QueryError, RelatedMode, Shape,
};

/// Evaluator resolving links over HTTP with default options.
pub fn connect(config: &ClientConfig) -> Result<Evaluator> {
    Ok(Evaluator::new(Arc::new(HttpFetcher::new(config)?)))
}
