//! Required-field checks, one per phase.

use siftql_model::{Direction, FilterError, RequiredPhase};

use crate::dsl::ParsedQuery;
use crate::matching::Match;
use crate::registry::FilterRegistry;

/// Every field required on string filters must appear in `parsed`.
///
/// # Errors
///
/// [`FilterError::RequiredField`] naming the first missing field.
pub fn check_string_filter(
    registry: &FilterRegistry,
    parsed: &ParsedQuery,
) -> Result<(), FilterError> {
    check(registry, RequiredPhase::StringFilter, |field| {
        parsed.mentions(field)
    })
}

/// Every field required on execution must be filtered or sorted on.
///
/// # Errors
///
/// [`FilterError::RequiredField`] naming the first missing field.
pub fn check_execution(
    registry: &FilterRegistry,
    matches: &[Match],
    sorts: &[(String, Direction)],
) -> Result<(), FilterError> {
    check(registry, RequiredPhase::Execution, |field| {
        matches.iter().any(|m| m.field() == field) || sorts.iter().any(|(f, _)| f == field)
    })
}

/// Every field required on sort must take part in the active sort.
///
/// # Errors
///
/// [`FilterError::RequiredField`] naming the first missing field.
pub fn check_sort(registry: &FilterRegistry, sorts: &[(String, Direction)]) -> Result<(), FilterError> {
    check(registry, RequiredPhase::Sort, |field| {
        sorts.iter().any(|(f, _)| f == field)
    })
}

fn check(
    registry: &FilterRegistry,
    phase: RequiredPhase,
    present: impl Fn(&str) -> bool,
) -> Result<(), FilterError> {
    let missing = registry.fields().find(|definition| {
        let required = match phase {
            RequiredPhase::StringFilter => definition.required.on_string_filter,
            RequiredPhase::Execution => definition.required.on_execution,
            RequiredPhase::Sort => definition.required.on_sort,
        };
        required && !present(&definition.name)
    });
    match missing {
        Some(definition) => Err(FilterError::RequiredField {
            field: definition.name.clone(),
            phase,
        }),
        None => Ok(()),
    }
}
