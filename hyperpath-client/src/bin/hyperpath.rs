//! hyperpath CLI
//!
//! Evaluates a path, selection query or shape against a linked JSON document.
//!
//! Usage:
//!   cargo run -p hyperpath-client --features cli --bin hyperpath -- \
//!     https://api.example.com/customers/1 --path order.order_number
//!
//! Examples:
//!   # First two order numbers, without fetching further pages
//!   hyperpath https://api.example.com/customers/1 --path order.order_number --limit 2
//!
//!   # Selection query against a local document, relative links resolved against a base
//!   hyperpath customer.json --base-url https://api.example.com/ \
//!     --query '{ name order { order_number } }'
//!
//!   # Shape read from a file, expanding every related item
//!   cat customer.json | hyperpath - --shape shape.json --all-related

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::{StreamExt, TryStreamExt};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use hyperpath_client::{connect, ClientConfig, EvalOptions, Evaluator, RelatedMode, Shape};

/// Query linked, paginated JSON documents
#[derive(Parser, Debug)]
#[command(name = "hyperpath")]
#[command(about = "Evaluate paths and selection queries over linked JSON documents")]
struct Args {
    /// http(s) URL, JSON file path, or `-` for stdin
    source: String,

    /// Dot-separated path (e.g. "order.order_number")
    #[arg(long, short = 'p', conflicts_with_all = ["query", "shape"])]
    path: Option<String>,

    /// Selection query text (e.g. "{ name order { order_number } }")
    #[arg(long, short = 'q', conflicts_with = "shape")]
    query: Option<String>,

    /// JSON file holding a shape ({"properties": [...], "related": {...}})
    #[arg(long, short = 's')]
    shape: Option<PathBuf>,

    /// Prefer `<key>__latest` values
    #[arg(long)]
    latest: bool,

    /// Expand every related item instead of only the first
    #[arg(long)]
    all_related: bool,

    /// Stop after this many path values
    #[arg(long, short = 'l')]
    limit: Option<usize>,

    /// Base URL for relative links (overrides HYPERPATH_BASE_URL)
    #[arg(long)]
    base_url: Option<Url>,
}

/// Where the root document comes from.
enum Source {
    Url(String),
    Document(Value),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = args.base_url.clone() {
        config = config.with_base_url(base_url);
    }

    let options = EvalOptions::new()
        .with_latest(args.latest)
        .with_related(if args.all_related {
            RelatedMode::All
        } else {
            RelatedMode::First
        });
    let evaluator = connect(&config)?.with_options(options);

    let source = load_source(&args.source).await?;
    let output = run(&evaluator, &args, source).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn load_source(source: &str) -> Result<Source> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(Source::Url(source.to_string()));
    }

    let text = if source == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read document from stdin")?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read document: {}", source))?
    };

    let document = serde_json::from_str(&text)
        .with_context(|| format!("Document is not valid JSON: {}", source))?;
    Ok(Source::Document(document))
}

async fn run(evaluator: &Evaluator, args: &Args, source: Source) -> Result<Value> {
    if let Some(text) = &args.query {
        info!(query = %text, "evaluating selection query");
        let result = match source {
            Source::Url(url) => evaluator.query_url(&url, text).await?,
            Source::Document(document) => evaluator.query_document(&document, text).await?,
        };
        return Ok(result.into_value().await?);
    }

    if let Some(file) = &args.shape {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read shape: {}", file.display()))?;
        let shape: Shape = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid shape: {}", file.display()))?;
        let result = match source {
            Source::Url(url) => evaluator.follow_shape(&url, &shape).await?,
            Source::Document(document) => evaluator.eval_shape(&document, &shape).await?,
        };
        return Ok(result.into_value().await?);
    }

    let path = split_path(args.path.as_deref());
    info!(?path, "evaluating path");
    let stream = match source {
        Source::Url(url) => evaluator.follow_link(url, path)?,
        Source::Document(document) => evaluator.eval_path(document, path)?,
    };

    let values: Vec<Value> = match args.limit {
        Some(limit) => stream.take(limit).try_collect().await?,
        None => stream.try_collect().await?,
    };
    Ok(Value::Array(values))
}

/// "a.b.c" -> ["a", "b", "c"]; no path means the document itself.
fn split_path(path: Option<&str>) -> Vec<String> {
    match path {
        Some(path) if !path.is_empty() => path.split('.').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
