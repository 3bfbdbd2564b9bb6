//! Query-string filter engine for siftql.
//!
//! A [`FilterRegistry`] validates a filter shape against the host's entity
//! schema once. Each request then gets a [`QueryFilterState`], parsed from a
//! query string such as `title=like:rust&year=gte:2020&sort=-year` or built
//! through the API, and [`QueryFilterState::build`] turns it into a
//! [`FilterQuery`](siftql_model::FilterQuery) for the host query layer.

mod build;
pub mod config;
pub mod dsl;
pub mod expression;
pub mod matching;
pub mod operation;
pub mod path;
pub mod predicate;
pub mod registry;
pub mod required;
pub mod sort;
pub mod state;

pub use config::FilterConfig;
pub use dsl::Grammar;
pub use matching::{ExpressionEvaluator, FieldValue, Match};
pub use registry::FilterRegistry;
pub use state::QueryFilterState;
