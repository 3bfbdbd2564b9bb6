//! Binding of `(field, operation, values)` to a field definition.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use siftql_model::{FilterError, FilterValue, Operation};

use super::coercion::{coerce, parse_bool};
use crate::config::FilterConfig;
use crate::registry::{ElementDefinition, FieldDefinition, FieldKind};

/// Computes the values of fields declared with an expression instead of
/// literal values.
///
/// `context` maps each field initialised before this one to its raw values.
pub trait ExpressionEvaluator: fmt::Debug + Send + Sync {
    /// Evaluates `expression`, returning zero or more raw values.
    fn evaluate(
        &self,
        expression: &str,
        context: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<String>, String>;
}

/// Introspection view of an active match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    /// Field name.
    pub name: String,
    /// Operation.
    pub operation: Operation,
    /// Raw values; the expression text for computed values not yet evaluated.
    pub values: Vec<String>,
}

/// Coerced values of a match, by field kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bound {
    /// Computed value waiting for evaluation.
    Pending,
    /// Blank values ignored; the match yields no condition.
    Blank,
    /// One value list per element path.
    Element(Vec<Vec<FilterValue>>),
    /// Key/value pairs of a JSON object.
    Json(Vec<(String, String)>),
    /// Concrete entity names.
    Types(Vec<String>),
    /// Cardinality.
    Size(i64),
}

/// One field bound to an operation and its values.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    field: String,
    operation: Operation,
    values: Vec<String>,
    expression: Option<String>,
    bound: Bound,
    injected: bool,
}

impl Match {
    /// Binds literal values.
    ///
    /// # Errors
    ///
    /// Operation, arity and coercion errors, see [`check_operation`].
    pub fn literal(
        definition: &FieldDefinition,
        operation: Operation,
        values: Vec<String>,
        config: &FilterConfig,
    ) -> Result<Self, FilterError> {
        check_operation(definition, operation)?;
        let bound = bind(definition, operation, &values, config)?;
        Ok(Self {
            field: definition.name.clone(),
            operation,
            values,
            expression: None,
            bound,
            injected: false,
        })
    }

    /// Binds a raw value as written in a query string, splitting it for
    /// multi-valued operations.
    pub fn parsed(
        definition: &FieldDefinition,
        operation: Operation,
        raw: &str,
        config: &FilterConfig,
    ) -> Result<Self, FilterError> {
        let values = split_raw(definition, operation, raw, config.value_separator);
        Self::literal(definition, operation, values, config)
    }

    /// Binds a value computed from `expression` at build time.
    pub fn computed(
        definition: &FieldDefinition,
        operation: Operation,
        expression: impl Into<String>,
    ) -> Result<Self, FilterError> {
        check_operation(definition, operation)?;
        Ok(Self {
            field: definition.name.clone(),
            operation,
            values: Vec::new(),
            expression: Some(expression.into()),
            bound: Bound::Pending,
            injected: false,
        })
    }

    /// Evaluates a computed value. Literal matches are already bound.
    pub fn initialize(
        &mut self,
        definition: &FieldDefinition,
        evaluator: Option<&dyn ExpressionEvaluator>,
        context: &BTreeMap<String, Vec<String>>,
        config: &FilterConfig,
    ) -> Result<(), FilterError> {
        let Some(expression) = self.expression.as_deref() else {
            return Ok(());
        };
        if self.bound != Bound::Pending {
            return Ok(());
        }
        let evaluator = evaluator.ok_or_else(|| FilterError::Expression {
            field: self.field.clone(),
            message: format!("no evaluator for '{expression}'"),
        })?;
        let values = evaluator
            .evaluate(expression, context)
            .map_err(|message| FilterError::Expression {
                field: self.field.clone(),
                message,
            })?;
        self.bound = bind(definition, self.operation, &values, config)?;
        self.values = values;
        Ok(())
    }

    /// Field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operation.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Raw values; empty for a computed value not yet evaluated.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Expression of a computed value.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// `true` when the match was injected by a presence trigger.
    #[must_use]
    pub fn is_injected(&self) -> bool {
        self.injected
    }

    pub(crate) fn mark_injected(mut self) -> Self {
        self.injected = true;
        self
    }

    pub(crate) fn bound(&self) -> &Bound {
        &self.bound
    }

    /// Introspection view.
    #[must_use]
    pub fn to_field_value(&self) -> FieldValue {
        let values = match (&self.expression, &self.bound) {
            (Some(expression), Bound::Pending) => vec![expression.clone()],
            _ => self.values.clone(),
        };
        FieldValue {
            name: self.field.clone(),
            operation: self.operation,
            values,
        }
    }
}

/// Checks `operation` against the kind, terminal type and allow-list of a
/// field.
///
/// # Errors
///
/// - [`FilterError::NotValuable`] for sortable fields.
/// - [`FilterError::UnsupportedArrayOperation`] for array operations on a
///   non-array element.
/// - [`FilterError::OperationNotAllowed`] when the terminal type does not
///   support the operation or the allow-list excludes it.
pub fn check_operation(definition: &FieldDefinition, operation: Operation) -> Result<(), FilterError> {
    let not_allowed = || FilterError::OperationNotAllowed {
        field: definition.name.clone(),
        operation,
    };

    match &definition.kind {
        FieldKind::Sortable(_) => {
            return Err(FilterError::NotValuable {
                field: definition.name.clone(),
                usage: "filtering".to_owned(),
            });
        }
        FieldKind::Element(element) => {
            if operation.is_array() && !element.array {
                return Err(FilterError::UnsupportedArrayOperation {
                    field: definition.name.clone(),
                    operation,
                });
            }
            if !element_supports(element, operation) {
                return Err(not_allowed());
            }
        }
        FieldKind::Json(_) | FieldKind::Discriminator(_) | FieldKind::Collection(_) => {}
    }

    if definition.allows(operation) {
        Ok(())
    } else {
        Err(not_allowed())
    }
}

/// Type compatibility of an element operation, ignoring the allow-list.
pub(crate) fn element_supports(element: &ElementDefinition, operation: Operation) -> bool {
    if operation.is_array() {
        return element.array;
    }
    if element.array && (operation.is_ordering() || operation.is_pattern()) {
        return false;
    }
    if operation.is_ordering() && !element.value_type.is_orderable() {
        return false;
    }
    if operation.is_pattern() && !element.value_type.is_text() {
        return false;
    }
    true
}

fn split_raw(
    definition: &FieldDefinition,
    operation: Operation,
    raw: &str,
    separator: char,
) -> Vec<String> {
    let multi = match &definition.kind {
        FieldKind::Element(element) => {
            operation.is_multi_valued()
                || (element.array && matches!(operation, Operation::Eq | Operation::Ne))
        }
        FieldKind::Discriminator(_) => matches!(operation, Operation::In | Operation::NotIn),
        _ => false,
    };
    if multi {
        raw.split(separator)
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect()
    } else {
        vec![raw.to_owned()]
    }
}

fn check_arity(field: &str, operation: Operation, count: usize, array: bool) -> Result<(), FilterError> {
    let (ok, expected) = match operation {
        Operation::Between => (count == 2, "exactly two values"),
        Operation::In | Operation::NotIn => (count >= 1, "at least one value"),
        op if op.is_array() => (count >= 1, "at least one value"),
        Operation::Eq | Operation::Ne if array => (count >= 1, "at least one value"),
        _ => (count == 1, "exactly one value"),
    };
    if ok {
        Ok(())
    } else {
        Err(FilterError::FilterValidity {
            field: field.to_owned(),
            operation,
            message: format!("expected {expected}, got {count}"),
        })
    }
}

fn bind(
    definition: &FieldDefinition,
    operation: Operation,
    values: &[String],
    config: &FilterConfig,
) -> Result<Bound, FilterError> {
    let field = definition.name.as_str();
    match &definition.kind {
        FieldKind::Element(element) => bind_element(field, element, operation, values, config),
        FieldKind::Json(_) => {
            check_arity(field, operation, values.len(), false)?;
            bind_json(field, &values[0]).map(Bound::Json)
        }
        FieldKind::Discriminator(discriminator) => {
            check_arity(field, operation, values.len(), false)?;
            let types = values
                .iter()
                .map(|v| {
                    discriminator.types.get(v).cloned().ok_or_else(|| {
                        FilterError::DiscriminatorValueNotFound {
                            field: field.to_owned(),
                            value: v.clone(),
                            allowed: discriminator.types.keys().cloned().collect(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Bound::Types(types))
        }
        FieldKind::Collection(_) => {
            check_arity(field, operation, values.len(), false)?;
            let raw = &values[0];
            raw.trim()
                .parse()
                .map(Bound::Size)
                .map_err(|_| FilterError::ValueParse {
                    field: field.to_owned(),
                    value: raw.clone(),
                    expected: "integer".to_owned(),
                })
        }
        FieldKind::Sortable(_) => Err(FilterError::NotValuable {
            field: field.to_owned(),
            usage: "filtering".to_owned(),
        }),
    }
}

fn bind_element(
    field: &str,
    element: &ElementDefinition,
    operation: Operation,
    values: &[String],
    config: &FilterConfig,
) -> Result<Bound, FilterError> {
    let kept: Vec<&String> = if element.ignore_blank {
        values.iter().filter(|v| !v.trim().is_empty()).collect()
    } else {
        values.iter().collect()
    };
    if element.ignore_blank && kept.is_empty() {
        return Ok(Bound::Blank);
    }
    check_arity(field, operation, kept.len(), element.array)?;

    let mut per_path = Vec::with_capacity(element.paths.len());
    for path in &element.paths {
        let coerced = kept
            .iter()
            .map(|raw| match operation {
                Operation::IsNull => parse_bool(raw).map(FilterValue::Boolean).ok_or_else(|| {
                    FilterError::ValueParse {
                        field: field.to_owned(),
                        value: (*raw).clone(),
                        expected: "boolean".to_owned(),
                    }
                }),
                Operation::Regex => Ok(FilterValue::Text((*raw).clone())),
                _ => coerce(field, raw, path.value_type(), element.format.as_deref(), config),
            })
            .collect::<Result<Vec<_>, _>>()?;
        per_path.push(coerced);
    }
    Ok(Bound::Element(per_path))
}

fn bind_json(field: &str, raw: &str) -> Result<Vec<(String, String)>, FilterError> {
    let json_error = |message: String| FilterError::JsonParse {
        field: field.to_owned(),
        message,
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| json_error(e.to_string()))?;
    let serde_json::Value::Object(object) = value else {
        return Err(json_error("expected a JSON object".to_owned()));
    };
    if object.is_empty() {
        return Err(json_error("expected at least one key".to_owned()));
    }
    object
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            serde_json::Value::Number(n) => Ok((key, n.to_string())),
            serde_json::Value::Bool(b) => Ok((key, b.to_string())),
            _ => Err(json_error(format!("value of key '{key}' must be a scalar"))),
        })
        .collect()
}
