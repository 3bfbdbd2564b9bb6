//! Field definition registry.
//!
//! A [`FilterRegistry`] is built once per `(filter shape, schema)` pair. Every
//! definition error surfaces from [`FilterRegistry::build`]; afterwards the
//! registry is immutable and can be shared (behind an `Arc`) by any number of
//! concurrent [`QueryFilterState`](crate::state::QueryFilterState)s.

mod builder;
pub mod definition;
pub mod triggers;

use std::collections::{BTreeMap, HashMap};

use siftql_model::Direction;

pub use definition::{
    CollectionDefinition, Combination, DiscriminatorDefinition, ElementDefinition,
    FieldDefinition, FieldKind, JsonDefinition, PredicateDefinition, SortableDefinition,
    SortablePath,
};
pub use triggers::TriggerGraph;

use crate::config::FilterConfig;
use crate::matching::Match;

/// Validated, read-only field definitions of one filter shape.
#[derive(Debug)]
pub struct FilterRegistry {
    entity: String,
    config: FilterConfig,
    /// Sorted by `order`, ties in declaration order.
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
    defaults: HashMap<String, Match>,
    triggers: TriggerGraph,
    default_sort: Vec<(String, Direction)>,
    predicates: BTreeMap<String, PredicateDefinition>,
}

impl FilterRegistry {
    /// Root entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Configuration used for parsing and coercion.
    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Evaluation position of a field.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All fields in evaluation order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    /// Pre-bound default match of a field.
    #[must_use]
    pub fn default_match(&self, name: &str) -> Option<&Match> {
        self.defaults.get(name)
    }

    /// Presence-trigger graph.
    #[must_use]
    pub fn triggers(&self) -> &TriggerGraph {
        &self.triggers
    }

    /// Sort used when a request does not sort.
    #[must_use]
    pub fn default_sort(&self) -> &[(String, Direction)] {
        &self.default_sort
    }

    /// Looks up a named predicate.
    #[must_use]
    pub fn predicate(&self, name: &str) -> Option<&PredicateDefinition> {
        self.predicates.get(name)
    }
}
