//! Error types.
//!
//! [`FilterError`] covers everything that can go wrong while parsing input,
//! mutating a filter state or building conditions. [`DefinitionError`] covers
//! registry construction: a misconfigured filter shape never yields a usable
//! registry.

use std::fmt;

use crate::operation::Operation;

/// Phase in which a required field was found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredPhase {
    /// Right after parsing a query string.
    StringFilter,
    /// When conditions are built.
    Execution,
    /// When the active sort is resolved.
    Sort,
}

impl fmt::Display for RequiredPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringFilter => f.write_str("string filter"),
            Self::Execution => f.write_str("execution"),
            Self::Sort => f.write_str("sort"),
        }
    }
}

/// Errors raised while parsing, matching or building filters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// A query segment matches neither the value nor the sort shape.
    #[error("invalid filter segment '{segment}' in '{input}'")]
    Parse {
        /// Offending segment.
        segment: String,
        /// Full input.
        input: String,
    },
    /// The field is not declared by the filter shape.
    #[error("filter field '{field}' not found")]
    FieldNotFound {
        /// Field name.
        field: String,
    },
    /// The operation code is unknown.
    #[error("filter operation '{operation}' not found")]
    OperationNotFound {
        /// Operation code.
        operation: String,
    },
    /// The operation is not allowed for the field.
    #[error("operation '{operation}' is not allowed for field '{field}'")]
    OperationNotAllowed {
        /// Field name.
        field: String,
        /// Operation.
        operation: Operation,
    },
    /// A discriminator value has no mapped subtype.
    #[error("discriminator value '{value}' not found for field '{field}' (allowed: {allowed:?})")]
    DiscriminatorValueNotFound {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Known values.
        allowed: Vec<String>,
    },
    /// A temporal value does not match the format.
    #[error("cannot parse '{value}' for field '{field}' with format '{format}'")]
    DateParse {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Expected format.
        format: String,
    },
    /// An enum value is not a constant of the enumeration.
    #[error("value '{value}' is not valid for field '{field}' (allowed: {allowed:?})")]
    EnumValue {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Constant names.
        allowed: Vec<String>,
    },
    /// A numeric, boolean or identifier value does not parse.
    #[error("value '{value}' is not a valid {expected} for field '{field}'")]
    ValueParse {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Expected type.
        expected: String,
    },
    /// Wrong number of values for the operation.
    #[error("invalid filter for field '{field}' with operation '{operation}': {message}")]
    FilterValidity {
        /// Field name.
        field: String,
        /// Operation.
        operation: Operation,
        /// Explanation.
        message: String,
    },
    /// A JSON field value is not a JSON object of strings.
    #[error("invalid JSON value for field '{field}': {message}")]
    JsonParse {
        /// Field name.
        field: String,
        /// Explanation.
        message: String,
    },
    /// The same field is sorted more than once.
    #[error("field '{field}' is sorted more than once")]
    MultipleSort {
        /// Field name.
        field: String,
    },
    /// A blocked field appears in parsed input.
    #[error("field '{field}' cannot be used in a query string")]
    BlockedField {
        /// Field name.
        field: String,
    },
    /// The API variant does not apply to the field kind.
    #[error("field '{field}' does not support {usage}")]
    NotValuable {
        /// Field name.
        field: String,
        /// Attempted usage.
        usage: String,
    },
    /// A required field is missing.
    #[error("field '{field}' is required on {phase}")]
    RequiredField {
        /// Field name.
        field: String,
        /// Violated phase.
        phase: RequiredPhase,
    },
    /// An array operation on a non-array field.
    #[error("operation '{operation}' requires an array field, '{field}' is not one")]
    UnsupportedArrayOperation {
        /// Field name.
        field: String,
        /// Operation.
        operation: Operation,
    },
    /// The predicate is not declared by the filter shape.
    #[error("predicate '{name}' not found")]
    PredicateNotFound {
        /// Predicate name.
        name: String,
    },
    /// A computed value could not be evaluated.
    #[error("cannot evaluate value of field '{field}': {message}")]
    Expression {
        /// Field name.
        field: String,
        /// Explanation.
        message: String,
    },
}

/// Stable error codes, one per [`FilterError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FilterErrorCode {
    /// Grammar parse error.
    ParseError,
    /// Unknown field.
    FieldNotFound,
    /// Unknown operation.
    OperationNotFound,
    /// Operation not allowed.
    OperationNotAllowed,
    /// Unknown discriminator value.
    DiscriminatorValueNotFound,
    /// Temporal parse error.
    DateParseError,
    /// Unknown enum constant.
    EnumValueError,
    /// Scalar parse error.
    ValueParseError,
    /// Wrong value arity.
    FilterValidityError,
    /// Invalid JSON value.
    JsonParseError,
    /// Duplicated sort field.
    MultipleSortError,
    /// Blocked field in input.
    BlockedFieldError,
    /// Wrong API variant for the field kind.
    NotValuableError,
    /// Missing required field.
    RequiredFieldError,
    /// Array operation on a non-array field.
    UnsupportedArrayOperation,
    /// Unknown predicate.
    PredicateNotFound,
    /// Computed value failure.
    ExpressionError,
}

impl FilterErrorCode {
    /// Returns the code as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::FieldNotFound => "FieldNotFound",
            Self::OperationNotFound => "OperationNotFound",
            Self::OperationNotAllowed => "OperationNotAllowed",
            Self::DiscriminatorValueNotFound => "DiscriminatorValueNotFound",
            Self::DateParseError => "DateParseError",
            Self::EnumValueError => "EnumValueError",
            Self::ValueParseError => "ValueParseError",
            Self::FilterValidityError => "FilterValidityError",
            Self::JsonParseError => "JsonParseError",
            Self::MultipleSortError => "MultipleSortError",
            Self::BlockedFieldError => "BlockedFieldError",
            Self::NotValuableError => "NotValuableError",
            Self::RequiredFieldError => "RequiredFieldError",
            Self::UnsupportedArrayOperation => "UnsupportedArrayOperation",
            Self::PredicateNotFound => "PredicateNotFound",
            Self::ExpressionError => "ExpressionError",
        }
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FilterError {
    /// Returns the stable code of this error.
    #[must_use]
    pub fn code(&self) -> FilterErrorCode {
        match self {
            Self::Parse { .. } => FilterErrorCode::ParseError,
            Self::FieldNotFound { .. } => FilterErrorCode::FieldNotFound,
            Self::OperationNotFound { .. } => FilterErrorCode::OperationNotFound,
            Self::OperationNotAllowed { .. } => FilterErrorCode::OperationNotAllowed,
            Self::DiscriminatorValueNotFound { .. } => FilterErrorCode::DiscriminatorValueNotFound,
            Self::DateParse { .. } => FilterErrorCode::DateParseError,
            Self::EnumValue { .. } => FilterErrorCode::EnumValueError,
            Self::ValueParse { .. } => FilterErrorCode::ValueParseError,
            Self::FilterValidity { .. } => FilterErrorCode::FilterValidityError,
            Self::JsonParse { .. } => FilterErrorCode::JsonParseError,
            Self::MultipleSort { .. } => FilterErrorCode::MultipleSortError,
            Self::BlockedField { .. } => FilterErrorCode::BlockedFieldError,
            Self::NotValuable { .. } => FilterErrorCode::NotValuableError,
            Self::RequiredField { .. } => FilterErrorCode::RequiredFieldError,
            Self::UnsupportedArrayOperation { .. } => FilterErrorCode::UnsupportedArrayOperation,
            Self::PredicateNotFound { .. } => FilterErrorCode::PredicateNotFound,
            Self::Expression { .. } => FilterErrorCode::ExpressionError,
        }
    }

    /// Returns the field the error is about, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::FieldNotFound { field }
            | Self::OperationNotAllowed { field, .. }
            | Self::DiscriminatorValueNotFound { field, .. }
            | Self::DateParse { field, .. }
            | Self::EnumValue { field, .. }
            | Self::ValueParse { field, .. }
            | Self::FilterValidity { field, .. }
            | Self::JsonParse { field, .. }
            | Self::MultipleSort { field }
            | Self::BlockedField { field }
            | Self::NotValuable { field, .. }
            | Self::RequiredField { field, .. }
            | Self::UnsupportedArrayOperation { field, .. }
            | Self::Expression { field, .. } => Some(field),
            Self::Parse { .. } | Self::OperationNotFound { .. } | Self::PredicateNotFound { .. } => {
                None
            }
        }
    }
}

/// Errors raised while building a registry from a filter shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// Two fields share a name.
    #[error("duplicate filter field '{field}'")]
    DuplicateField {
        /// Field name.
        field: String,
    },
    /// A field declares more than one kind section.
    #[error("field '{field}' declares more than one kind: {kinds:?}")]
    AmbiguousKind {
        /// Field name.
        field: String,
        /// Declared kinds.
        kinds: Vec<&'static str>,
    },
    /// A field declares no kind section.
    #[error("field '{field}' declares no kind")]
    MissingKind {
        /// Field name.
        field: String,
    },
    /// An element or sortable field has no path.
    #[error("field '{field}' declares no attribute path")]
    MissingPath {
        /// Field name.
        field: String,
    },
    /// An entity is not in the schema.
    #[error("entity '{entity}' not found")]
    UnknownEntity {
        /// Entity name.
        entity: String,
    },
    /// A path segment does not name an attribute.
    #[error("attribute '{attribute}' not found on entity '{entity}' (path '{path}')")]
    UnknownAttribute {
        /// Full path.
        path: String,
        /// Entity searched.
        entity: String,
        /// Missing attribute.
        attribute: String,
    },
    /// Too many or too few levels in a path.
    #[error("invalid field level in path '{path}' at segment '{segment}'")]
    FieldLevel {
        /// Full path.
        path: String,
        /// Offending segment.
        segment: String,
    },
    /// A path segment is malformed.
    #[error("invalid path syntax '{path}'")]
    PathSyntax {
        /// Full path.
        path: String,
    },
    /// A subtype hint is not reachable from the segment's entity.
    #[error("subtype '{subtype}' is not reachable from '{entity}' in path '{path}'")]
    UnreachableSubtype {
        /// Full path.
        path: String,
        /// Entity at the segment.
        entity: String,
        /// Requested subtype.
        subtype: String,
    },
    /// The paths of a multi-path element end at different types.
    #[error("paths of field '{field}' end at different types: '{first}' and '{other}'")]
    MismatchedPathTypes {
        /// Field name.
        field: String,
        /// First terminal type.
        first: String,
        /// Differing terminal type.
        other: String,
    },
    /// More join kinds are configured than a field's paths have relations.
    #[error("field '{field}' configures {joins} join kinds but its paths join at most {levels} relations")]
    TooManyJoins {
        /// Field name.
        field: String,
        /// Configured join kinds.
        joins: usize,
        /// Relations joined by the deepest path.
        levels: usize,
    },
    /// A collection field does not end at a multi-valued relation.
    #[error("field '{field}' must end at a multi-valued relation")]
    NotCollection {
        /// Field name.
        field: String,
    },
    /// A JSON field does not end at a JSON column.
    #[error("field '{field}' must end at a JSON column")]
    NotJson {
        /// Field name.
        field: String,
    },
    /// A discriminator subtype is unknown or outside the hierarchy.
    #[error("discriminator '{field}' maps to invalid subtype '{subtype}'")]
    InvalidSubtype {
        /// Field name.
        field: String,
        /// Offending subtype.
        subtype: String,
    },
    /// A configured operation does not fit the field.
    #[error("operation '{operation}' is invalid for field '{field}'")]
    InvalidOperation {
        /// Field name.
        field: String,
        /// Operation.
        operation: Operation,
    },
    /// A default value fails coercion.
    #[error("invalid default for field '{field}': {source}")]
    InvalidDefault {
        /// Field name.
        field: String,
        /// Coercion error.
        source: FilterError,
    },
    /// A presence trigger names an unknown field.
    #[error("field '{field}' triggers unknown field '{target}'")]
    UnknownTriggerTarget {
        /// Trigger source.
        field: String,
        /// Unknown target.
        target: String,
    },
    /// A presence trigger target has no default to inject.
    #[error("field '{field}' triggers '{target}', which has no default")]
    TriggerWithoutDefault {
        /// Trigger source.
        field: String,
        /// Target without default.
        target: String,
    },
    /// Presence triggers form a cycle.
    #[error("presence triggers form a cycle: {}", cycle.join(" -> "))]
    TriggerCycle {
        /// Fields along the cycle.
        cycle: Vec<String>,
    },
    /// A default sort entry does not name a sortable field.
    #[error("default sort field '{field}' is not a sortable field")]
    UnknownSortField {
        /// Field name.
        field: String,
    },
    /// A predicate is malformed or names an unknown field.
    #[error("invalid predicate '{name}': {message}")]
    Predicate {
        /// Predicate name.
        name: String,
        /// Explanation.
        message: String,
    },
    /// Two predicates share a name.
    #[error("duplicate predicate '{name}'")]
    DuplicatePredicate {
        /// Predicate name.
        name: String,
    },
}
