//! Condition tree, join table and ordering handed to the host query layer.
//!
//! The engine never talks to a database. It produces a [`FilterQuery`]: a
//! table of joins rooted at [`JoinAlias::ROOT`], an optional boolean
//! [`Condition`] over attributes reachable through those joins, and a list of
//! [`SortInstruction`]s. The host translates this data into its own query.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::Direction;
use crate::value::FilterValue;

/// Identifies a join instance; `0` is the root entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinAlias(pub usize);

impl JoinAlias {
    /// The root entity.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for JoinAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// How a relationship is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinKind {
    /// Inner join.
    Inner,
    /// Left outer join.
    #[default]
    Left,
    /// Left outer join that also loads the related rows.
    Fetch,
    /// Inner join that also loads the related rows.
    InnerFetch,
    /// Correlated existence check; only referenced through [`Condition::Exists`].
    Exists,
}

impl JoinKind {
    /// Returns `true` when rows without a related row are dropped.
    #[must_use]
    pub fn is_inner(self) -> bool {
        matches!(self, Self::Inner | Self::InnerFetch)
    }

    /// Returns `true` when the related rows are loaded.
    #[must_use]
    pub fn is_fetch(self) -> bool {
        matches!(self, Self::Fetch | Self::InnerFetch)
    }

    /// Kind of a join shared by a user of `self` and a user of `other`.
    ///
    /// Inner wins over left and fetching is kept. Existence joins are never
    /// shared and stay as they are.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self == Self::Exists || other == Self::Exists {
            return self;
        }
        match (self.is_inner() || other.is_inner(), self.is_fetch() || other.is_fetch()) {
            (true, true) => Self::InnerFetch,
            (true, false) => Self::Inner,
            (false, true) => Self::Fetch,
            (false, false) => Self::Left,
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => f.write_str("INNER JOIN"),
            Self::Left => f.write_str("LEFT JOIN"),
            Self::Fetch => f.write_str("LEFT JOIN FETCH"),
            Self::InnerFetch => f.write_str("INNER JOIN FETCH"),
            Self::Exists => f.write_str("EXISTS"),
        }
    }
}

/// One join of the join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    /// Alias of this join.
    pub alias: JoinAlias,
    /// Alias the relationship is navigated from.
    pub parent: JoinAlias,
    /// Relationship attribute on the parent.
    pub attribute: String,
    /// Join kind.
    pub kind: JoinKind,
    /// Concrete subtype the joined entity is treated as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treat: Option<String>,
}

/// An attribute of a joined entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRef {
    /// Owning join.
    pub alias: JoinAlias,
    /// Attribute name.
    pub attribute: String,
}

impl AttributeRef {
    /// Creates an attribute reference.
    #[must_use]
    pub fn new(alias: JoinAlias, attribute: impl Into<String>) -> Self {
        Self {
            alias,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.attribute)
    }
}

/// The left-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Operand {
    /// A terminal attribute.
    Attribute(AttributeRef),
    /// Lower-cased operand.
    Lower {
        /// Operand to fold.
        operand: Box<Operand>,
    },
    /// Text of one key extracted from a JSON column.
    JsonText {
        /// JSON column.
        column: AttributeRef,
        /// Extracted key.
        key: String,
    },
}

impl Operand {
    /// Wraps the operand in a case fold.
    #[must_use]
    pub fn lower(self) -> Self {
        Self::Lower {
            operand: Box::new(self),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(attr) => write!(f, "{attr}"),
            Self::Lower { operand } => write!(f, "lower({operand})"),
            Self::JsonText { column, key } => write!(f, "{column}->>'{key}'"),
        }
    }
}

/// Scalar comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
        }
    }
}

/// Native array functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrayFunction {
    /// Same elements, ignoring order and duplicates.
    Equals,
    /// Column contains every value.
    Contains,
    /// Column shares at least one value.
    Overlaps,
    /// Every column element is among the values.
    ContainedBy,
}

impl fmt::Display for ArrayFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => f.write_str("array_equals"),
            Self::Contains => f.write_str("array_contains"),
            Self::Overlaps => f.write_str("array_overlaps"),
            Self::ContainedBy => f.write_str("array_contained_by"),
        }
    }
}

/// Boolean condition tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// Conjunction.
    And {
        /// Children.
        conditions: Vec<Condition>,
    },
    /// Disjunction.
    Or {
        /// Children.
        conditions: Vec<Condition>,
    },
    /// Negation.
    Not {
        /// Negated child.
        condition: Box<Condition>,
    },
    /// `operand op value`.
    Compare {
        /// Left-hand side.
        operand: Operand,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        value: FilterValue,
    },
    /// Inclusive range.
    Between {
        /// Tested operand.
        operand: Operand,
        /// Lower bound.
        low: FilterValue,
        /// Upper bound.
        high: FilterValue,
    },
    /// SQL `LIKE` with `%`/`_` wildcards and `\` escapes.
    Like {
        /// Tested operand.
        operand: Operand,
        /// Wildcard pattern.
        pattern: String,
    },
    /// Native regular-expression match.
    Regex {
        /// Tested operand.
        operand: Operand,
        /// Pattern.
        pattern: String,
    },
    /// Membership.
    In {
        /// Tested operand.
        operand: Operand,
        /// Candidate values.
        values: Vec<FilterValue>,
    },
    /// Null test.
    IsNull {
        /// Tested operand.
        operand: Operand,
    },
    /// Native array relationship.
    Array {
        /// Array column.
        operand: Operand,
        /// Function.
        function: ArrayFunction,
        /// Right-hand values.
        values: Vec<FilterValue>,
    },
    /// Runtime concrete type of a join is one of `types`.
    TypeIs {
        /// Tested join.
        alias: JoinAlias,
        /// Concrete entity names.
        types: Vec<String>,
    },
    /// Cardinality of a multi-valued relationship.
    Size {
        /// Relationship attribute.
        collection: AttributeRef,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        value: i64,
    },
    /// Some row of a correlated existence join satisfies `condition`.
    Exists {
        /// Correlated join (kind [`JoinKind::Exists`]).
        alias: JoinAlias,
        /// Condition evaluated per related row.
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Conjunction that collapses: no children is `None`, one child is itself.
    #[must_use]
    pub fn all(mut conditions: Vec<Self>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Self::And { conditions }),
        }
    }

    /// Disjunction with the same collapsing rules as [`Condition::all`].
    #[must_use]
    pub fn any(mut conditions: Vec<Self>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Self::Or { conditions }),
        }
    }

    /// Negates the condition.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not { condition } => *condition,
            other => Self::Not {
                condition: Box::new(other),
            },
        }
    }

    /// Negates the condition when `negated` is set.
    #[must_use]
    pub fn negate_if(self, negated: bool) -> Self {
        if negated { self.negate() } else { self }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And { conditions } => write_joined(f, conditions, " AND "),
            Self::Or { conditions } => write_joined(f, conditions, " OR "),
            Self::Not { condition } => write!(f, "NOT {condition}"),
            Self::Compare { operand, op, value } => write!(f, "{operand} {op} '{value}'"),
            Self::Between { operand, low, high } => {
                write!(f, "{operand} BETWEEN '{low}' AND '{high}'")
            }
            Self::Like { operand, pattern } => write!(f, "{operand} LIKE '{pattern}'"),
            Self::Regex { operand, pattern } => write!(f, "{operand} ~ '{pattern}'"),
            Self::In { operand, values } => {
                write!(f, "{operand} IN (")?;
                write_values(f, values)?;
                f.write_str(")")
            }
            Self::IsNull { operand } => write!(f, "{operand} IS NULL"),
            Self::Array {
                operand,
                function,
                values,
            } => {
                write!(f, "{function}({operand}, [")?;
                write_values(f, values)?;
                f.write_str("])")
            }
            Self::TypeIs { alias, types } => write!(f, "type({alias}) IN ({})", types.join(", ")),
            Self::Size {
                collection,
                op,
                value,
            } => write!(f, "size({collection}) {op} {value}"),
            Self::Exists { alias, condition } => write!(f, "EXISTS {alias} ({condition})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{c}")?;
    }
    f.write_str(")")
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[FilterValue]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{v}'")?;
    }
    Ok(())
}

/// One ordering instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortInstruction {
    /// Sorted attribute.
    pub attribute: AttributeRef,
    /// Direction.
    pub direction: Direction,
}

/// Everything the host needs to assemble its query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    /// Root entity.
    pub entity: String,
    /// Join table, in creation order.
    pub joins: Vec<Join>,
    /// Filter condition; `None` means no filtering.
    pub condition: Option<Condition>,
    /// Ordering, in priority order.
    pub ordering: Vec<SortInstruction>,
}

impl FilterQuery {
    /// Looks up a join by alias.
    #[must_use]
    pub fn join(&self, alias: JoinAlias) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }
}
