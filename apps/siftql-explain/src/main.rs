//! siftql-explain - prints what a filter query string compiles to.
//!
//! Loads an entity schema catalog and a filter shape from JSON files, parses
//! the query string against them and prints the active field values, the
//! active sort, the rendered condition and the full [`FilterQuery`] as JSON.
//!
//! # Usage
//!
//! ```text
//! siftql-explain schema.json shape.json 'title=like:rust&year=gte:2020&sort=-year'
//! SIFTQL_GRAMMAR=bracket siftql-explain schema.json shape.json 'title[like]=rust'
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SIFTQL_GRAMMAR` | `colon` | Query-string grammar (`colon` or `bracket`) |
//! | `SIFTQL_VALUE_SEPARATOR` | `,` | Separator of multi-valued operations |
//! | `SIFTQL_DECODE_VALUES` | `true` | Percent-decode query segments |
//! | `SIFTQL_IGNORE_UNKNOWN_KEYS` | `false` | Skip unknown keys in parameter maps |
//! | `SIFTQL_DATE_FORMAT` | `%Y-%m-%d` | Default date format |
//! | `SIFTQL_DATE_TIME_FORMAT` | `%Y-%m-%dT%H:%M:%S` | Default date-time format |
//! | `SIFTQL_TIME_FORMAT` | `%H:%M:%S` | Default time format |
//! | `SIFTQL_PREDICATE` | *(unset)* | Named predicate to apply |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use siftql_core::{FieldValue, FilterConfig, FilterRegistry, QueryFilterState};
use siftql_model::{Direction, FilterQuery, FilterShape, SchemaCatalog};

const USAGE: &str = "usage: siftql-explain <schema.json> <shape.json> [query]";

/// Output document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Explain<'a> {
    fields: Vec<FieldValue>,
    sort: &'a [(String, Direction)],
    predicate: Option<&'a str>,
    condition: Option<String>,
    query: &'a FilterQuery,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Read and deserialize a JSON file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    let config = FilterConfig::from_env();
    init_tracing(&config.log_level)?;

    let mut args = std::env::args().skip(1);
    let (Some(schema_path), Some(shape_path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let input = args.next().unwrap_or_default();
    if args.next().is_some() {
        bail!(USAGE);
    }

    let catalog: SchemaCatalog = read_json(Path::new(&schema_path))?;
    let shape: FilterShape = read_json(Path::new(&shape_path))?;
    info!(
        entity = %shape.entity,
        entities = catalog.entities.len(),
        fields = shape.fields.len(),
        grammar = ?config.grammar,
        "loaded filter shape",
    );

    let registry = FilterRegistry::build(&shape, &catalog, config)
        .with_context(|| format!("invalid filter shape {shape_path}"))?;
    let mut state = QueryFilterState::parse(Arc::new(registry), &input)
        .with_context(|| format!("invalid query string: {input}"))?;
    if let Ok(name) = std::env::var("SIFTQL_PREDICATE") {
        state
            .set_predicate(&name)
            .with_context(|| format!("unknown predicate: {name}"))?;
    }

    let query = state.build().context("failed to build conditions")?;
    let explain = Explain {
        fields: state.get_all_field_values(),
        sort: state.get_sort_fields(),
        predicate: state.predicate(),
        condition: query.condition.as_ref().map(ToString::to_string),
        query: &query,
    };
    println!("{}", serde_json::to_string_pretty(&explain)?);

    Ok(())
}
