//! Named predicate composition.

use std::collections::BTreeMap;
use std::convert::Infallible;

use siftql_model::Condition;

use crate::expression::Leaf;
use crate::registry::PredicateDefinition;

/// Combines per-field condition groups into the final condition.
///
/// Without a predicate every group is ANDed. With one, its expression is
/// reduced over the groups: a field without a group takes its entry from
/// `substitutes` or drops out of the expression. Groups of fields the
/// expression does not mention are ANDed with its result.
#[must_use]
pub fn compose(
    groups: Vec<(String, Condition)>,
    predicate: Option<&PredicateDefinition>,
    substitutes: &BTreeMap<String, Condition>,
) -> Option<Condition> {
    let Some(predicate) = predicate else {
        return Condition::all(groups.into_iter().map(|(_, c)| c).collect());
    };

    let mentioned = predicate.expression.names();
    let combined = predicate
        .expression
        .reduce(&mut |leaf| {
            Ok::<_, Infallible>(match leaf {
                Leaf::Name(name) => groups
                    .iter()
                    .find(|(field, _)| field == name)
                    .map(|(_, c)| c)
                    .or_else(|| substitutes.get(name))
                    .cloned(),
                Leaf::Placeholder(_) => None,
            })
        })
        .unwrap_or_else(|never| match never {});

    let mut conditions: Vec<Condition> = combined.into_iter().collect();
    conditions.extend(
        groups
            .into_iter()
            .filter(|(field, _)| !mentioned.contains(field.as_str()))
            .map(|(_, c)| c),
    );
    Condition::all(conditions)
}
