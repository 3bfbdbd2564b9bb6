//! Validated field definitions.

use std::collections::BTreeMap;

use siftql_model::{DefaultSpec, JoinKind, Operation, RequiredSpec, ValueType};

use crate::expression::BoolExpr;
use crate::matching::Match;
use crate::path::AttributePath;

/// A validated field: shared envelope plus its kind.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Filter name.
    pub name: String,
    /// Evaluation order.
    pub order: i32,
    /// Rejected in parsed input.
    pub blocked: bool,
    /// Required-ness per phase.
    pub required: RequiredSpec,
    /// Fields defaulted while this one is present.
    pub on_present: Vec<String>,
    /// Default match, checked against the field at build time.
    pub default: Option<DefaultSpec>,
    /// Kind-specific part.
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Operations the field accepts; empty for sortable fields.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        match &self.kind {
            FieldKind::Element(e) => &e.operations,
            FieldKind::Json(j) => &j.operations,
            FieldKind::Discriminator(d) => &d.operations,
            FieldKind::Collection(c) => &c.operations,
            FieldKind::Sortable(_) => &[],
        }
    }

    /// Returns `true` when `operation` is in the allow-list.
    #[must_use]
    pub fn allows(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    /// Returns `true` for fields that only take part in ordering.
    #[must_use]
    pub fn is_sortable(&self) -> bool {
        matches!(self.kind, FieldKind::Sortable(_))
    }
}

/// The five field kinds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Comparison against terminal attributes.
    Element(ElementDefinition),
    /// Per-key matching in a JSON column.
    Json(JsonDefinition),
    /// Concrete subtype selection.
    Discriminator(DiscriminatorDefinition),
    /// Cardinality of a multi-valued relation.
    Collection(CollectionDefinition),
    /// Ordering only.
    Sortable(SortableDefinition),
}

impl FieldKind {
    /// Kind name as used in shape metadata.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Json(_) => "json",
            Self::Discriminator(_) => "discriminator",
            Self::Collection(_) => "collection",
            Self::Sortable(_) => "sortable",
        }
    }
}

/// How conditions of a multi-path element are combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combination {
    /// Every path matches.
    And,
    /// Any path matches.
    Or,
    /// Parsed `$n` expression.
    Expression(BoolExpr),
}

/// Element field.
#[derive(Debug, Clone)]
pub struct ElementDefinition {
    /// Resolved paths, in declaration order.
    pub paths: Vec<AttributePath>,
    /// Terminal type shared by every path.
    pub value_type: ValueType,
    /// Allowed operations.
    pub operations: Vec<Operation>,
    /// Native array column.
    pub array: bool,
    /// Case-sensitive pattern matching.
    pub case_sensitive: bool,
    /// Blank values produce no condition.
    pub ignore_blank: bool,
    /// `chrono` format for temporal values.
    pub format: Option<String>,
    /// Multi-valued levels become existence checks.
    pub subquery: bool,
    /// Combination of multiple paths.
    pub combine: Combination,
    /// Join kind per path level.
    pub joins: Vec<JoinKind>,
}

/// JSON field.
#[derive(Debug, Clone)]
pub struct JsonDefinition {
    /// Path to the JSON column.
    pub path: AttributePath,
    /// Case-sensitive matching.
    pub case_sensitive: bool,
    /// Allowed operations.
    pub operations: Vec<Operation>,
}

/// Discriminator field.
#[derive(Debug, Clone)]
pub struct DiscriminatorDefinition {
    /// Polymorphic relationship; the root entity when `None`.
    pub path: Option<AttributePath>,
    /// Query value to concrete entity name.
    pub types: BTreeMap<String, String>,
    /// Allowed operations.
    pub operations: Vec<Operation>,
}

/// Collection field.
#[derive(Debug, Clone)]
pub struct CollectionDefinition {
    /// Path to the multi-valued relation.
    pub path: AttributePath,
    /// Allowed operations.
    pub operations: Vec<Operation>,
}

/// Sortable field.
#[derive(Debug, Clone)]
pub struct SortableDefinition {
    /// Paths in ordering priority.
    pub paths: Vec<SortablePath>,
}

/// One path of a sortable field.
#[derive(Debug, Clone)]
pub struct SortablePath {
    /// Attribute path.
    pub path: AttributePath,
    /// Join the relationships on this path eagerly.
    pub auto_fetch: bool,
}

/// Named predicate, parsed.
#[derive(Debug, Clone)]
pub struct PredicateDefinition {
    /// Predicate name.
    pub name: String,
    /// Parsed expression.
    pub expression: BoolExpr,
    /// Substitute `missing_operation`/`missing_values` for absent fields
    /// instead of dropping their sub-expression.
    pub include_missing: bool,
    /// Operation of the substitute.
    pub missing_operation: Operation,
    /// Values of the substitute.
    pub missing_values: Vec<String>,
    /// Pre-bound substitute per mentioned field, when `include_missing` is set.
    pub substitutes: BTreeMap<String, Match>,
    /// Mentioned fields whose kind does not accept `missing_operation`; their
    /// sub-expression is dropped when they are absent.
    pub unsubstituted: Vec<String>,
}
