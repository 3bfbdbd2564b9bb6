//! Sort resolution.
//!
//! The active sort is either the request's override list or, when the
//! request never sorted, the shape's default sort. Each sortable field fans
//! out to one instruction per declared path, all in the field's direction.

use siftql_model::{Direction, FilterError, JoinKind, SortInstruction};

use crate::path::JoinCache;
use crate::registry::{FieldKind, FilterRegistry, SortableDefinition};

/// Checks that `field` can be sorted on.
///
/// # Errors
///
/// [`FilterError::FieldNotFound`] or, for a field that is not sortable,
/// [`FilterError::NotValuable`].
pub fn sortable<'a>(
    registry: &'a FilterRegistry,
    field: &str,
) -> Result<&'a SortableDefinition, FilterError> {
    let definition = registry
        .field(field)
        .ok_or_else(|| FilterError::FieldNotFound {
            field: field.to_owned(),
        })?;
    match &definition.kind {
        FieldKind::Sortable(sortable) => Ok(sortable),
        _ => Err(FilterError::NotValuable {
            field: field.to_owned(),
            usage: "sorting".to_owned(),
        }),
    }
}

/// Expands `sorts` into ordering instructions, joining their paths through
/// `cache`. Auto-fetch paths request fetch joins at every level.
///
/// # Errors
///
/// See [`sortable`].
pub fn resolve_sort(
    registry: &FilterRegistry,
    sorts: &[(String, Direction)],
    cache: &mut JoinCache,
) -> Result<Vec<SortInstruction>, FilterError> {
    let mut ordering = Vec::new();
    for (field, direction) in sorts {
        for path in &sortable(registry, field)?.paths {
            let kinds = if path.auto_fetch {
                vec![JoinKind::Fetch; path.path.segments().len()]
            } else {
                Vec::new()
            };
            let location = cache.locate_value(&path.path, &kinds, false);
            ordering.push(SortInstruction {
                attribute: location.attribute,
                direction: *direction,
            });
        }
    }
    Ok(ordering)
}
