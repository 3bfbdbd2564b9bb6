//! Raw filter-shape metadata.
//!
//! A filter shape declares which fields a filter exposes and how each maps
//! onto the entity schema. It is plain data (usually loaded from JSON or built
//! in code) and is validated once when the registry is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::JoinKind;
use crate::operation::{Direction, Operation};

/// The declared filter shape over one root entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterShape {
    /// Root entity name.
    pub entity: String,
    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Sort applied when the request does not sort.
    #[serde(default)]
    pub default_sort: Vec<SortSpec>,
    /// Named predicates.
    #[serde(default)]
    pub predicates: Vec<PredicateSpec>,
}

impl FilterShape {
    /// Creates an empty shape over `entity`.
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a default sort entry.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.default_sort.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Adds a named predicate.
    #[must_use]
    pub fn predicate(mut self, predicate: PredicateSpec) -> Self {
        self.predicates.push(predicate);
        self
    }
}

/// Required-ness flags, one per validation phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredSpec {
    /// Must appear in a parsed query string.
    #[serde(default)]
    pub on_string_filter: bool,
    /// Must be present when conditions are built.
    #[serde(default)]
    pub on_execution: bool,
    /// Must take part in the active sort.
    #[serde(default)]
    pub on_sort: bool,
}

/// Default match of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSpec {
    /// Operation of the default match.
    pub operation: Operation,
    /// Literal values.
    #[serde(default)]
    pub values: Vec<String>,
    /// Expression computed by the host evaluator instead of literal values.
    #[serde(default)]
    pub expression: Option<String>,
}

impl DefaultSpec {
    /// A default with literal values.
    #[must_use]
    pub fn values<I, S>(operation: Operation, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            values: values.into_iter().map(Into::into).collect(),
            expression: None,
        }
    }

    /// A default computed from an expression.
    #[must_use]
    pub fn expression(operation: Operation, expression: impl Into<String>) -> Self {
        Self {
            operation,
            values: Vec::new(),
            expression: Some(expression.into()),
        }
    }
}

/// One declared field. Exactly one of the kind sections must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Filter name, unique within the shape.
    pub name: String,
    /// Evaluation order; ties keep declaration order.
    #[serde(default)]
    pub order: i32,
    /// Rejected when it appears in a parsed query string.
    #[serde(default)]
    pub blocked: bool,
    /// Required-ness per phase.
    #[serde(default)]
    pub required: RequiredSpec,
    /// Fields whose defaults are injected while this field is present.
    #[serde(default)]
    pub on_present: Vec<String>,
    /// Default match.
    #[serde(default)]
    pub default: Option<DefaultSpec>,
    /// Element (attribute comparison) section.
    #[serde(default)]
    pub element: Option<ElementSpec>,
    /// JSON column section.
    #[serde(default)]
    pub json: Option<JsonSpec>,
    /// Discriminator (concrete subtype) section.
    #[serde(default)]
    pub discriminator: Option<DiscriminatorSpec>,
    /// Collection cardinality section.
    #[serde(default)]
    pub collection: Option<CollectionSpec>,
    /// Sort-only section.
    #[serde(default)]
    pub sortable: Option<SortableSpec>,
}

impl FieldSpec {
    /// An element field.
    #[must_use]
    pub fn element(name: impl Into<String>, element: ElementSpec) -> Self {
        Self {
            name: name.into(),
            element: Some(element),
            ..Self::default()
        }
    }

    /// A JSON field.
    #[must_use]
    pub fn json(name: impl Into<String>, json: JsonSpec) -> Self {
        Self {
            name: name.into(),
            json: Some(json),
            ..Self::default()
        }
    }

    /// A discriminator field.
    #[must_use]
    pub fn discriminator(name: impl Into<String>, discriminator: DiscriminatorSpec) -> Self {
        Self {
            name: name.into(),
            discriminator: Some(discriminator),
            ..Self::default()
        }
    }

    /// A collection field.
    #[must_use]
    pub fn collection(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: Some(CollectionSpec {
                path: path.into(),
                operations: None,
            }),
            ..Self::default()
        }
    }

    /// A sortable field.
    #[must_use]
    pub fn sortable(name: impl Into<String>, sortable: SortableSpec) -> Self {
        Self {
            name: name.into(),
            sortable: Some(sortable),
            ..Self::default()
        }
    }

    /// Sets the evaluation order.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Marks the field as blocked in parsed input.
    #[must_use]
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    /// Sets the required-ness flags.
    #[must_use]
    pub fn required(mut self, required: RequiredSpec) -> Self {
        self.required = required;
        self
    }

    /// Sets the default match.
    #[must_use]
    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds a presence trigger target.
    #[must_use]
    pub fn on_present(mut self, target: impl Into<String>) -> Self {
        self.on_present.push(target.into());
        self
    }
}

/// How the conditions of a multi-path element are combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathCombination {
    /// All paths must match.
    #[default]
    And,
    /// Any path may match.
    Or,
    /// Boolean expression over `$1`, `$2`, ... (1-based path positions).
    Expression(String),
}

/// Element section: comparison against one or more terminal attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSpec {
    /// Attribute paths; all must end at the same value type.
    pub paths: Vec<String>,
    /// Explicit operation allow-list; inferred from the terminal type if absent.
    #[serde(default)]
    pub operations: Option<Vec<Operation>>,
    /// Native array column.
    #[serde(default)]
    pub array: bool,
    /// Case-sensitive pattern matching.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    /// Blank values produce no condition.
    #[serde(default)]
    pub ignore_blank: bool,
    /// `chrono` format for temporal values.
    #[serde(default)]
    pub format: Option<String>,
    /// Multi-valued segments become correlated existence checks.
    #[serde(default)]
    pub subquery: bool,
    /// Combination of multiple paths.
    #[serde(default)]
    pub combine: PathCombination,
    /// Join kind per path level; missing levels use `left`.
    #[serde(default)]
    pub joins: Vec<JoinKind>,
}

impl ElementSpec {
    /// An element over the given paths with every other option defaulted.
    #[must_use]
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            operations: None,
            array: false,
            case_sensitive: true,
            ignore_blank: false,
            format: None,
            subquery: false,
            combine: PathCombination::And,
            joins: Vec::new(),
        }
    }

    /// Sets the operation allow-list.
    #[must_use]
    pub fn operations<I: IntoIterator<Item = Operation>>(mut self, operations: I) -> Self {
        self.operations = Some(operations.into_iter().collect());
        self
    }

    /// Marks the element as a native array column.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Makes pattern matching case-insensitive.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Drops the condition when no non-blank value remains.
    #[must_use]
    pub fn ignore_blank(mut self) -> Self {
        self.ignore_blank = true;
        self
    }

    /// Sets the temporal format.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Uses existence subqueries for multi-valued segments.
    #[must_use]
    pub fn subquery(mut self) -> Self {
        self.subquery = true;
        self
    }

    /// Sets the multi-path combination.
    #[must_use]
    pub fn combine(mut self, combine: PathCombination) -> Self {
        self.combine = combine;
        self
    }

    /// Sets the join kind per path level.
    #[must_use]
    pub fn joins<I: IntoIterator<Item = JoinKind>>(mut self, joins: I) -> Self {
        self.joins = joins.into_iter().collect();
        self
    }
}

/// JSON section: per-key matching inside a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSpec {
    /// Path to the JSON column.
    pub path: String,
    /// Case-sensitive matching.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    /// Explicit allow-list; defaults to every JSON operation.
    #[serde(default)]
    pub operations: Option<Vec<Operation>>,
}

impl JsonSpec {
    /// A case-sensitive JSON field over `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            case_sensitive: true,
            operations: None,
        }
    }
}

/// Discriminator section: selects concrete subtypes by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscriminatorSpec {
    /// Path to the polymorphic relationship; the root entity when absent.
    #[serde(default)]
    pub path: Option<String>,
    /// Query value to concrete entity name.
    pub types: BTreeMap<String, String>,
    /// Explicit allow-list; defaults to every discriminator operation.
    #[serde(default)]
    pub operations: Option<Vec<Operation>>,
}

impl DiscriminatorSpec {
    /// A discriminator on the root entity.
    #[must_use]
    pub fn new<I, K, V>(types: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            path: None,
            types: types
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            operations: None,
        }
    }

    /// Places the discriminator on a relationship path.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Collection section: cardinality comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    /// Path to a multi-valued relationship.
    pub path: String,
    /// Explicit allow-list; defaults to every collection operation.
    #[serde(default)]
    pub operations: Option<Vec<Operation>>,
}

/// One path of a sortable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortablePathSpec {
    /// Attribute path.
    pub path: String,
    /// Eagerly join the relationships on this path.
    #[serde(default)]
    pub auto_fetch: bool,
}

/// Sortable section: one or more attribute paths used for ordering only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortableSpec {
    /// Attribute paths, in ordering priority.
    pub paths: Vec<SortablePathSpec>,
}

impl SortableSpec {
    /// A sortable over plain (lazily joined) paths.
    #[must_use]
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| SortablePathSpec {
                    path: p.into(),
                    auto_fetch: false,
                })
                .collect(),
        }
    }

    /// Adds an eagerly joined path.
    #[must_use]
    pub fn fetch(mut self, path: impl Into<String>) -> Self {
        self.paths.push(SortablePathSpec {
            path: path.into(),
            auto_fetch: true,
        });
        self
    }
}

/// A default sort entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    /// Sortable field name.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

/// A named boolean expression over field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateSpec {
    /// Predicate name.
    pub name: String,
    /// Expression such as `author AND (title OR summary)`.
    pub expression: String,
    /// Substitute a condition for mentioned fields that are absent.
    #[serde(default)]
    pub include_missing: bool,
    /// Operation of the substitute condition.
    #[serde(default = "default_missing_operation")]
    pub missing_operation: Operation,
    /// Values of the substitute condition.
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,
}

impl PredicateSpec {
    /// A predicate that drops sub-expressions of absent fields.
    #[must_use]
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            include_missing: false,
            missing_operation: default_missing_operation(),
            missing_values: default_missing_values(),
        }
    }

    /// Substitutes `operation` with `values` for absent fields.
    #[must_use]
    pub fn include_missing<I, S>(mut self, operation: Operation, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_missing = true;
        self.missing_operation = operation;
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_missing_operation() -> Operation {
    Operation::IsNull
}

fn default_missing_values() -> Vec<String> {
    vec!["true".to_owned()]
}
