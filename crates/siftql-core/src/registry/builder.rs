//! Registry construction and validation.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use siftql_model::{
    CollectionSpec, DefinitionError, DiscriminatorSpec, ElementSpec, FieldSpec, FilterShape,
    JsonSpec, Operation, PathCombination, PredicateSpec, SchemaReflector, SortableSpec,
};

use super::definition::{
    CollectionDefinition, Combination, DiscriminatorDefinition, ElementDefinition,
    FieldDefinition, FieldKind, JsonDefinition, PredicateDefinition, SortableDefinition,
    SortablePath,
};
use super::triggers::TriggerGraph;
use super::FilterRegistry;
use crate::config::FilterConfig;
use crate::expression::{check_names, check_placeholders, parse_expression};
use crate::matching::{Match, element_supports};
use crate::path::{AttributePath, resolve_path};

impl FilterRegistry {
    /// Validates `shape` against the schema exposed by `reflector`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found. A shape that fails here
    /// never yields a registry.
    pub fn build(
        shape: &FilterShape,
        reflector: &impl SchemaReflector,
        config: FilterConfig,
    ) -> Result<Self, DefinitionError> {
        if reflector.entity(&shape.entity).is_none() {
            return Err(DefinitionError::UnknownEntity {
                entity: shape.entity.clone(),
            });
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(shape.fields.len());
        for spec in &shape.fields {
            if !seen.insert(spec.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    field: spec.name.clone(),
                });
            }
            fields.push(build_field(spec, &shape.entity, reflector)?);
        }
        fields.sort_by_key(|f| f.order);

        let index: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        let triggers = TriggerGraph::build(&fields)?;

        let mut defaults = HashMap::new();
        for field in &fields {
            let Some(default) = &field.default else {
                continue;
            };
            let bound = match &default.expression {
                Some(expression) => Match::computed(field, default.operation, expression.clone()),
                None => Match::literal(field, default.operation, default.values.clone(), &config),
            };
            let bound = bound.map_err(|source| DefinitionError::InvalidDefault {
                field: field.name.clone(),
                source,
            })?;
            defaults.insert(field.name.clone(), bound);
        }

        let mut default_sort = Vec::with_capacity(shape.default_sort.len());
        for sort in &shape.default_sort {
            let sortable = index
                .get(&sort.field)
                .is_some_and(|&i| fields[i].is_sortable());
            if !sortable {
                return Err(DefinitionError::UnknownSortField {
                    field: sort.field.clone(),
                });
            }
            default_sort.push((sort.field.clone(), sort.direction));
        }

        let mut predicates = BTreeMap::new();
        for spec in &shape.predicates {
            if predicates.contains_key(&spec.name) {
                return Err(DefinitionError::DuplicatePredicate {
                    name: spec.name.clone(),
                });
            }
            let predicate = build_predicate(spec, &fields, &index, &config)?;
            predicates.insert(spec.name.clone(), predicate);
        }

        debug!(
            entity = %shape.entity,
            fields = fields.len(),
            defaults = defaults.len(),
            predicates = predicates.len(),
            "filter registry built"
        );

        Ok(Self {
            entity: shape.entity.clone(),
            config,
            fields,
            index,
            defaults,
            triggers,
            default_sort,
            predicates,
        })
    }
}

fn build_field(
    spec: &FieldSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<FieldDefinition, DefinitionError> {
    let mut kinds = Vec::new();
    if spec.element.is_some() {
        kinds.push("element");
    }
    if spec.json.is_some() {
        kinds.push("json");
    }
    if spec.discriminator.is_some() {
        kinds.push("discriminator");
    }
    if spec.collection.is_some() {
        kinds.push("collection");
    }
    if spec.sortable.is_some() {
        kinds.push("sortable");
    }
    if kinds.len() > 1 {
        return Err(DefinitionError::AmbiguousKind {
            field: spec.name.clone(),
            kinds,
        });
    }

    let name = spec.name.as_str();
    let kind = if let Some(element) = &spec.element {
        FieldKind::Element(build_element(name, element, root, reflector)?)
    } else if let Some(json) = &spec.json {
        FieldKind::Json(build_json(name, json, root, reflector)?)
    } else if let Some(discriminator) = &spec.discriminator {
        FieldKind::Discriminator(build_discriminator(name, discriminator, root, reflector)?)
    } else if let Some(collection) = &spec.collection {
        FieldKind::Collection(build_collection(name, collection, root, reflector)?)
    } else if let Some(sortable) = &spec.sortable {
        FieldKind::Sortable(build_sortable(name, sortable, root, reflector)?)
    } else {
        return Err(DefinitionError::MissingKind {
            field: spec.name.clone(),
        });
    };

    Ok(FieldDefinition {
        name: spec.name.clone(),
        order: spec.order,
        blocked: spec.blocked,
        required: spec.required,
        on_present: spec.on_present.clone(),
        default: spec.default.clone(),
        kind,
    })
}

fn build_element(
    name: &str,
    spec: &ElementSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<ElementDefinition, DefinitionError> {
    if spec.paths.is_empty() {
        return Err(DefinitionError::MissingPath {
            field: name.to_owned(),
        });
    }
    let paths = resolve_terminals(&spec.paths, root, reflector)?;
    let value_type = paths[0].value_type().clone();
    if let Some(other) = paths.iter().find(|p| p.value_type() != &value_type) {
        return Err(DefinitionError::MismatchedPathTypes {
            field: name.to_owned(),
            first: value_type.to_string(),
            other: other.value_type().to_string(),
        });
    }

    let levels = paths
        .iter()
        .map(|p| p.segments().len() - 1)
        .max()
        .unwrap_or_default();
    if spec.joins.len() > levels {
        return Err(DefinitionError::TooManyJoins {
            field: name.to_owned(),
            joins: spec.joins.len(),
            levels,
        });
    }

    let combine = match &spec.combine {
        PathCombination::And => Combination::And,
        PathCombination::Or => Combination::Or,
        PathCombination::Expression(text) => {
            let expr = parse_expression(text)
                .and_then(|expr| check_placeholders(&expr, paths.len()).map(|()| expr))
                .map_err(|e| DefinitionError::Predicate {
                    name: name.to_owned(),
                    message: e.to_string(),
                })?;
            Combination::Expression(expr)
        }
    };

    let mut element = ElementDefinition {
        paths,
        value_type,
        operations: Vec::new(),
        array: spec.array,
        case_sensitive: spec.case_sensitive,
        ignore_blank: spec.ignore_blank,
        format: spec.format.clone(),
        subquery: spec.subquery,
        combine,
        joins: spec.joins.clone(),
    };
    element.operations = match &spec.operations {
        Some(explicit) => {
            if let Some(&op) = explicit.iter().find(|op| !element_supports(&element, **op)) {
                return Err(DefinitionError::InvalidOperation {
                    field: name.to_owned(),
                    operation: op,
                });
            }
            explicit.clone()
        }
        None => Operation::ALL
            .into_iter()
            .filter(|op| element_supports(&element, *op))
            .collect(),
    };
    Ok(element)
}

fn build_json(
    name: &str,
    spec: &JsonSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<JsonDefinition, DefinitionError> {
    let path = resolve_path(reflector, root, &spec.path)?;
    if !matches!(path.value_type(), siftql_model::ValueType::Json) {
        return Err(DefinitionError::NotJson {
            field: name.to_owned(),
        });
    }
    Ok(JsonDefinition {
        path,
        case_sensitive: spec.case_sensitive,
        operations: family_operations(name, spec.operations.as_deref(), &Operation::JSON)?,
    })
}

fn build_discriminator(
    name: &str,
    spec: &DiscriminatorSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<DiscriminatorDefinition, DefinitionError> {
    let path = spec
        .path
        .as_deref()
        .map(|p| resolve_path(reflector, root, p))
        .transpose()?;
    let base = match &path {
        Some(path) => {
            path.require_relation()?;
            path.last().target().unwrap_or(root).to_owned()
        }
        None => root.to_owned(),
    };

    if let Some(subtype) = spec
        .types
        .values()
        .find(|t| reflector.entity(t).is_none() || !reflector.is_subtype(t, &base))
    {
        return Err(DefinitionError::InvalidSubtype {
            field: name.to_owned(),
            subtype: subtype.clone(),
        });
    }

    Ok(DiscriminatorDefinition {
        path,
        types: spec.types.clone(),
        operations: family_operations(
            name,
            spec.operations.as_deref(),
            &Operation::DISCRIMINATOR,
        )?,
    })
}

fn build_collection(
    name: &str,
    spec: &CollectionSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<CollectionDefinition, DefinitionError> {
    let path = resolve_path(reflector, root, &spec.path)?;
    let last = path.last();
    if last.terminal || !last.kind.is_multi_valued() {
        return Err(DefinitionError::NotCollection {
            field: name.to_owned(),
        });
    }
    Ok(CollectionDefinition {
        path,
        operations: family_operations(name, spec.operations.as_deref(), &Operation::COLLECTION)?,
    })
}

fn build_sortable(
    name: &str,
    spec: &SortableSpec,
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<SortableDefinition, DefinitionError> {
    if spec.paths.is_empty() {
        return Err(DefinitionError::MissingPath {
            field: name.to_owned(),
        });
    }
    let mut paths = Vec::with_capacity(spec.paths.len());
    for p in &spec.paths {
        let path = resolve_path(reflector, root, &p.path)?;
        path.require_terminal()?;
        paths.push(SortablePath {
            path,
            auto_fetch: p.auto_fetch,
        });
    }
    Ok(SortableDefinition { paths })
}

fn resolve_terminals(
    paths: &[String],
    root: &str,
    reflector: &impl SchemaReflector,
) -> Result<Vec<AttributePath>, DefinitionError> {
    paths
        .iter()
        .map(|p| {
            let path = resolve_path(reflector, root, p)?;
            path.require_terminal()?;
            Ok(path)
        })
        .collect()
}

/// The explicit allow-list restricted to `family`, or the whole family.
fn family_operations(
    name: &str,
    explicit: Option<&[Operation]>,
    family: &[Operation],
) -> Result<Vec<Operation>, DefinitionError> {
    let Some(explicit) = explicit else {
        return Ok(family.to_vec());
    };
    match explicit.iter().find(|op| !family.contains(op)) {
        Some(&operation) => Err(DefinitionError::InvalidOperation {
            field: name.to_owned(),
            operation,
        }),
        None => Ok(explicit.to_vec()),
    }
}

fn build_predicate(
    spec: &PredicateSpec,
    fields: &[FieldDefinition],
    index: &HashMap<String, usize>,
    config: &FilterConfig,
) -> Result<PredicateDefinition, DefinitionError> {
    let predicate_error = |message: String| DefinitionError::Predicate {
        name: spec.name.clone(),
        message,
    };
    let filterable = |name: &str| index.get(name).is_some_and(|&i| !fields[i].is_sortable());

    let expression = parse_expression(&spec.expression).map_err(|e| predicate_error(e.to_string()))?;
    check_names(&expression, filterable).map_err(|e| predicate_error(e.to_string()))?;
    if !expression.placeholders().is_empty() {
        return Err(predicate_error("placeholders are not allowed".to_owned()));
    }

    let mut substitutes = BTreeMap::new();
    let mut unsubstituted = Vec::new();
    if spec.include_missing {
        for name in expression.names() {
            let Some(&i) = index.get(name) else {
                continue;
            };
            if !fields[i].allows(spec.missing_operation) {
                unsubstituted.push(name.to_owned());
                continue;
            }
            let substitute = Match::literal(
                &fields[i],
                spec.missing_operation,
                spec.missing_values.clone(),
                config,
            )
            .map_err(|e| predicate_error(format!("substitute for '{name}': {e}")))?;
            substitutes.insert(name.to_owned(), substitute);
        }
    }

    Ok(PredicateDefinition {
        name: spec.name.clone(),
        expression,
        include_missing: spec.include_missing,
        missing_operation: spec.missing_operation,
        missing_values: spec.missing_values.clone(),
        substitutes,
        unsubstituted,
    })
}
