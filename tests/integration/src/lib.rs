//! End-to-end tests for siftql.
//!
//! A blog schema and filter shape are compiled into a [`FilterRegistry`];
//! query strings and API calls are built into a
//! [`FilterQuery`](siftql_model::FilterQuery) and run through the in-memory
//! [`engine`] over a fixed set of JSON rows.
//!
//! Run them with:
//! ```text
//! cargo test -p siftql-integration
//! ```

use std::sync::{Arc, Once};

use serde_json::{Value, json};

use siftql_core::{FilterConfig, FilterRegistry, QueryFilterState};
use siftql_model::{
    AttributeDescriptor, DefaultSpec, Direction, DiscriminatorSpec, ElementSpec,
    EntityDescriptor, FieldSpec, FilterError, FilterShape, JsonSpec, Operation, PredicateSpec,
    RelationKind, SchemaCatalog, SortableSpec, ValueType,
};

pub mod engine;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Blog schema: posts (articles and reviews) with an author and comments.
#[must_use]
pub fn catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with(
            EntityDescriptor::new("Post")
                .with(AttributeDescriptor::scalar("id", ValueType::Integer))
                .with(AttributeDescriptor::scalar("title", ValueType::Text))
                .with(AttributeDescriptor::scalar("year", ValueType::Integer))
                .with(AttributeDescriptor::scalar("published", ValueType::Boolean))
                .with(AttributeDescriptor::scalar(
                    "status",
                    ValueType::Enum(vec!["DRAFT".to_owned(), "LIVE".to_owned()]),
                ))
                .with(AttributeDescriptor::scalar("tags", ValueType::Text))
                .with(AttributeDescriptor::scalar("meta", ValueType::Json))
                .with(AttributeDescriptor::scalar("likes", ValueType::Integer))
                .with(AttributeDescriptor::scalar("shares", ValueType::Integer))
                .with(AttributeDescriptor::relation(
                    "author",
                    RelationKind::Scalar,
                    "Person",
                ))
                .with(AttributeDescriptor::relation(
                    "comments",
                    RelationKind::List,
                    "Comment",
                )),
        )
        .with(
            EntityDescriptor::new("Article")
                .extends("Post")
                .with(AttributeDescriptor::scalar("words", ValueType::Integer)),
        )
        .with(
            EntityDescriptor::new("Review")
                .extends("Post")
                .with(AttributeDescriptor::scalar("rating", ValueType::Integer)),
        )
        .with(
            EntityDescriptor::new("Person")
                .with(AttributeDescriptor::scalar("name", ValueType::Text))
                .with(AttributeDescriptor::scalar("country", ValueType::Text)),
        )
        .with(
            EntityDescriptor::new("Comment")
                .with(AttributeDescriptor::scalar("body", ValueType::Text))
                .with(AttributeDescriptor::scalar("score", ValueType::Integer)),
        )
}

/// Filter shape over [`catalog`].
#[must_use]
pub fn shape() -> FilterShape {
    FilterShape::new("Post")
        .field(
            FieldSpec::element("title", ElementSpec::new(["title"]).case_insensitive())
                .on_present("published"),
        )
        .field(FieldSpec::element("year", ElementSpec::new(["year"])))
        .field(
            FieldSpec::element("published", ElementSpec::new(["published"]))
                .with_default(DefaultSpec::values(Operation::Eq, ["true"])),
        )
        .field(FieldSpec::element("status", ElementSpec::new(["status"])))
        .field(FieldSpec::element(
            "tags",
            ElementSpec::new(["tags"])
                .array()
                .operations([
                    Operation::Eq,
                    Operation::In,
                    Operation::Overlap,
                    Operation::Contained,
                ]),
        ))
        .field(FieldSpec::element("author", ElementSpec::new(["author.name"])))
        .field(FieldSpec::element(
            "commentBody",
            ElementSpec::new(["comments.body"]).subquery(),
        ))
        .field(FieldSpec::element("likes", ElementSpec::new(["likes"])))
        .field(FieldSpec::element("shares", ElementSpec::new(["shares"])))
        .field(FieldSpec::json("meta", JsonSpec::new("meta")))
        .field(FieldSpec::discriminator(
            "type",
            DiscriminatorSpec::new([("A", "Article"), ("R", "Review")]),
        ))
        .field(FieldSpec::collection("comments", "comments"))
        .field(FieldSpec::sortable("byYear", SortableSpec::new(["year"])))
        .field(FieldSpec::sortable(
            "byAuthor",
            SortableSpec::default().fetch("author.name"),
        ))
        .predicate(PredicateSpec::new("OR_LIKES", "likes OR shares"))
}

/// Builds the registry of `shape` over [`catalog`].
#[must_use]
pub fn registry_of(shape: &FilterShape, config: FilterConfig) -> Arc<FilterRegistry> {
    init_tracing();
    match FilterRegistry::build(shape, &catalog(), config) {
        Ok(registry) => Arc::new(registry),
        Err(e) => panic!("invalid test shape: {e}"),
    }
}

/// Registry of [`shape`] with the default configuration.
#[must_use]
pub fn registry() -> Arc<FilterRegistry> {
    registry_of(&shape(), FilterConfig::default())
}

/// Parses `input` against [`registry`].
pub fn parse(input: &str) -> Result<QueryFilterState, FilterError> {
    QueryFilterState::parse(registry(), input)
}

/// Builds `state` and returns the ids of the selected [`rows`].
pub fn run(state: &QueryFilterState) -> Result<Vec<i64>, FilterError> {
    let query = state.build()?;
    Ok(engine::execute_ids(&query, &rows()))
}

/// Parses `input` and returns the ids of the selected [`rows`].
pub fn query_ids(input: &str) -> Result<Vec<i64>, FilterError> {
    run(&parse(input)?)
}

/// Sort list in `(field, direction)` form.
#[must_use]
pub fn sorts(fields: &[(&str, Direction)]) -> Vec<(String, Direction)> {
    fields
        .iter()
        .map(|(field, direction)| ((*field).to_owned(), *direction))
        .collect()
}

/// The post rows.
#[must_use]
pub fn rows() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "__type": "Article",
            "title": "Rust in Action",
            "year": 2021,
            "published": true,
            "status": "LIVE",
            "tags": ["TAG1", "TAG2"],
            "meta": {"lang": "en", "draft": false},
            "likes": 10,
            "shares": 0,
            "author": {"name": "Ann", "country": "NO"},
            "comments": [
                {"body": "great", "score": 5},
                {"body": "meh", "score": 2}
            ]
        }),
        json!({
            "id": 2,
            "__type": "Review",
            "title": "Async Rust",
            "year": 2019,
            "published": false,
            "status": "DRAFT",
            "tags": ["TAG5"],
            "meta": {"lang": "de"},
            "likes": 0,
            "shares": 7,
            "author": {"name": "Bob", "country": "SE"},
            "comments": []
        }),
        json!({
            "id": 3,
            "__type": "Article",
            "title": "Go Basics",
            "year": 2023,
            "published": true,
            "status": "LIVE",
            "tags": ["TAG3"],
            "meta": null,
            "likes": 0,
            "shares": 0,
            "author": null,
            "comments": [
                {"body": "nice", "score": 4}
            ]
        }),
    ]
}

mod test_array;
mod test_element;
mod test_predicate;
mod test_relation;
mod test_required;
mod test_sort;
mod test_state;
