//! Condition building.
//!
//! One build owns one [`JoinCache`]. The sort is resolved first so auto-fetch
//! joins exist before filters navigate the same relationships; matches are
//! then initialised in field order, each seeing the raw values of the ones
//! before it, and resolved into per-field condition groups.

use std::collections::BTreeMap;

use tracing::debug;

use siftql_model::{Condition, Direction, FilterError, FilterQuery};

use crate::matching::{ExpressionEvaluator, Match};
use crate::operation::resolve_match;
use crate::path::JoinCache;
use crate::predicate::compose;
use crate::registry::FilterRegistry;
use crate::{required, sort};

/// Builds the query of `matches` under `sorts` and the optional predicate.
pub(crate) fn build(
    registry: &FilterRegistry,
    matches: &[Match],
    sorts: &[(String, Direction)],
    predicate: Option<&str>,
    evaluator: Option<&dyn ExpressionEvaluator>,
) -> Result<FilterQuery, FilterError> {
    required::check_execution(registry, matches, sorts)?;
    required::check_sort(registry, sorts)?;

    let predicate = predicate
        .map(|name| {
            registry
                .predicate(name)
                .ok_or_else(|| FilterError::PredicateNotFound {
                    name: name.to_owned(),
                })
        })
        .transpose()?;

    let mut cache = JoinCache::new();
    let ordering = sort::resolve_sort(registry, sorts, &mut cache)?;

    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by_key(|m| registry.position(m.field()));

    let mut context: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut groups: Vec<(String, Condition)> = Vec::with_capacity(ordered.len());
    for matched in ordered {
        let definition = registry
            .field(matched.field())
            .ok_or_else(|| FilterError::FieldNotFound {
                field: matched.field().to_owned(),
            })?;
        let mut matched = matched.clone();
        matched.initialize(definition, evaluator, &context, registry.config())?;
        if let Some(condition) = resolve_match(definition, &matched, &mut cache)? {
            groups.push((matched.field().to_owned(), condition));
        }
        context.insert(matched.field().to_owned(), matched.values().to_vec());
    }

    let mut substitutes = BTreeMap::new();
    if let Some(predicate) = predicate.filter(|p| p.include_missing) {
        for (name, substitute) in &predicate.substitutes {
            // blank matches yield no group and count as absent
            if groups.iter().any(|(field, _)| field == name) {
                continue;
            }
            let Some(definition) = registry.field(name) else {
                continue;
            };
            if let Some(condition) = resolve_match(definition, substitute, &mut cache)? {
                substitutes.insert(name.clone(), condition);
            }
        }
    }

    let condition = compose(groups, predicate, &substitutes);
    let joins = cache.into_joins();
    debug!(
        entity = %registry.entity(),
        joins = joins.len(),
        ordering = ordering.len(),
        predicate = predicate.map(|p| p.name.as_str()),
        filtered = condition.is_some(),
        "conditions built"
    );

    Ok(FilterQuery {
        entity: registry.entity().to_owned(),
        joins,
        condition,
        ordering,
    })
}
