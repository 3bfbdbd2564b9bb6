//! Operation resolvers.
//!
//! Each field kind has a const table mapping an [`Operation`] to a pure
//! strategy. [`resolve_match`] locates the attribute(s) of a bound match
//! through the per-build [`JoinCache`] and hands them to the strategy.

pub mod collection;
pub mod discriminator;
pub mod element;
pub mod json;

use siftql_model::{Condition, FilterError, FilterValue, JoinAlias, Operand, Operation};

use crate::expression::Leaf;
use crate::matching::{Bound, Match};
use crate::path::JoinCache;
use crate::registry::{Combination, ElementDefinition, FieldDefinition, FieldKind};
use element::ElementOperands;

/// Finds the entry of `operation` in a strategy table.
pub(crate) fn lookup<S: Copy>(table: &[(Operation, S)], operation: Operation) -> Option<S> {
    table
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, strategy)| *strategy)
}

/// Wildcard pattern for `like`, `starts` and `ends`; `%`, `_` and `\` in
/// `literal` are escaped.
#[must_use]
pub fn like_pattern(operation: Operation, literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() + 2);
    for c in literal.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    match operation {
        Operation::StartsWith => format!("{escaped}%"),
        Operation::EndsWith => format!("%{escaped}"),
        _ => format!("%{escaped}%"),
    }
}

/// Turns an initialised match into its condition group.
///
/// Returns `Ok(None)` for matches that yield no condition (blank values).
///
/// # Errors
///
/// [`FilterError::NotValuable`] for sortable fields,
/// [`FilterError::Expression`] for computed values not yet evaluated and
/// [`FilterError::OperationNotAllowed`] when no strategy exists.
pub fn resolve_match(
    definition: &FieldDefinition,
    matched: &Match,
    cache: &mut JoinCache,
) -> Result<Option<Condition>, FilterError> {
    let field = definition.name.as_str();
    let operation = matched.operation();
    let not_allowed = || FilterError::OperationNotAllowed {
        field: field.to_owned(),
        operation,
    };

    let condition = match (&definition.kind, matched.bound()) {
        (_, Bound::Blank) => return Ok(None),
        (_, Bound::Pending) => {
            return Err(FilterError::Expression {
                field: field.to_owned(),
                message: "value was not evaluated".to_owned(),
            });
        }
        (FieldKind::Sortable(_), _) => {
            return Err(FilterError::NotValuable {
                field: field.to_owned(),
                usage: "filtering".to_owned(),
            });
        }
        (FieldKind::Element(element), Bound::Element(per_path)) => {
            return resolve_element(field, element, operation, per_path, cache);
        }
        (FieldKind::Json(json), Bound::Json(pairs)) => {
            let location = cache.locate_value(&json.path, &[], false);
            json::resolve(operation, &location.attribute, pairs, json.case_sensitive)
                .ok_or_else(not_allowed)?
        }
        (FieldKind::Discriminator(discriminator), Bound::Types(types)) => {
            let alias = discriminator
                .path
                .as_ref()
                .map_or(JoinAlias::ROOT, |path| cache.locate_entity(path));
            discriminator::resolve(operation, alias, types.clone()).ok_or_else(not_allowed)?
        }
        (FieldKind::Collection(collection), Bound::Size(size)) => {
            let relation = cache.locate_probe(&collection.path);
            collection::resolve(operation, relation, *size).ok_or_else(not_allowed)?
        }
        _ => {
            return Err(FilterError::FilterValidity {
                field: field.to_owned(),
                operation,
                message: format!("values do not fit a {} field", definition.kind.label()),
            });
        }
    };
    Ok(Some(condition))
}

fn resolve_element(
    field: &str,
    element: &ElementDefinition,
    operation: Operation,
    per_path: &[Vec<FilterValue>],
    cache: &mut JoinCache,
) -> Result<Option<Condition>, FilterError> {
    let strategy = element::strategy(operation).ok_or_else(|| FilterError::OperationNotAllowed {
        field: field.to_owned(),
        operation,
    })?;

    let mut conditions = Vec::with_capacity(per_path.len());
    for (path, values) in element.paths.iter().zip(per_path) {
        let location = cache.locate_value(path, &element.joins, element.subquery);
        let condition = strategy(ElementOperands {
            operand: Operand::Attribute(location.attribute),
            values,
            case_sensitive: element.case_sensitive,
            array: element.array,
        })
        .ok_or_else(|| FilterError::FilterValidity {
            field: field.to_owned(),
            operation,
            message: format!("unexpected value count {}", values.len()),
        })?;
        conditions.push(match location.exists {
            Some(alias) => exists(alias, condition),
            None => condition,
        });
    }

    match &element.combine {
        Combination::And => Ok(Condition::all(conditions)),
        Combination::Or => Ok(Condition::any(conditions)),
        Combination::Expression(expr) => expr.reduce(&mut |leaf| {
            Ok(match leaf {
                Leaf::Placeholder(n) => n.checked_sub(1).and_then(|i| conditions.get(i)).cloned(),
                Leaf::Name(_) => None,
            })
        }),
    }
}

/// Wraps `condition` in a correlated existence check; a negation is hoisted
/// out so `ne`/`nin` mean "no related row matches".
fn exists(alias: JoinAlias, condition: Condition) -> Condition {
    match condition {
        Condition::Not { condition } => Condition::Exists { alias, condition }.negate(),
        other => Condition::Exists {
            alias,
            condition: Box::new(other),
        },
    }
}
