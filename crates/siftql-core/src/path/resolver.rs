//! Resolves dotted attribute paths against the host schema.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use siftql_model::{DefinitionError, RelationKind, SchemaReflector, ValueType};

static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\(([A-Za-z_][A-Za-z0-9_]*)\))?$")
        .expect("valid regex")
});

/// One resolved segment of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Attribute name.
    pub name: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// `true` when the segment is a directly comparable value.
    pub terminal: bool,
    /// Value type of the attribute.
    pub value_type: ValueType,
    /// Entity the attribute was looked up on.
    pub owner: String,
    /// Subtype the related entity is treated as, from a `segment(Subtype)` hint.
    pub treat: Option<String>,
}

impl PathSegment {
    /// Entity reached by navigating this segment, honouring the subtype hint.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.treat.as_deref().or_else(|| self.value_type.entity())
    }

    fn key(&self) -> String {
        match &self.treat {
            Some(treat) => format!("{}({treat})", self.name),
            None => self.name.clone(),
        }
    }
}

/// A fully resolved attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl AttributePath {
    /// The path as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolved segments, root first. Never empty.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The last segment.
    #[must_use]
    pub fn last(&self) -> &PathSegment {
        // resolve_path never yields an empty path
        &self.segments[self.segments.len() - 1]
    }

    /// Value type of the last segment.
    #[must_use]
    pub fn value_type(&self) -> &ValueType {
        &self.last().value_type
    }

    /// Cache key of the prefix ending at segment `index` (inclusive).
    #[must_use]
    pub fn prefix_key(&self, index: usize) -> String {
        self.segments[..=index]
            .iter()
            .map(PathSegment::key)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Fails unless the path ends at a terminal value.
    pub fn require_terminal(&self) -> Result<(), DefinitionError> {
        if self.last().terminal {
            Ok(())
        } else {
            Err(DefinitionError::FieldLevel {
                path: self.raw.clone(),
                segment: self.last().name.clone(),
            })
        }
    }

    /// Fails unless the path ends at a relationship to an entity.
    pub fn require_relation(&self) -> Result<(), DefinitionError> {
        if self.last().terminal {
            Err(DefinitionError::FieldLevel {
                path: self.raw.clone(),
                segment: self.last().name.clone(),
            })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolve `path` starting at `root`.
///
/// Each segment is looked up on the current entity (supertypes included).
/// Every segment but the last must navigate to an entity; a `segment(Subtype)`
/// hint moves resolution onto `Subtype` when it extends the segment's target.
///
/// # Errors
///
/// [`DefinitionError::UnknownEntity`], [`DefinitionError::PathSyntax`],
/// [`DefinitionError::UnknownAttribute`], [`DefinitionError::FieldLevel`] or
/// [`DefinitionError::UnreachableSubtype`].
pub fn resolve_path(
    reflector: &impl SchemaReflector,
    root: &str,
    path: &str,
) -> Result<AttributePath, DefinitionError> {
    if reflector.entity(root).is_none() {
        return Err(DefinitionError::UnknownEntity {
            entity: root.to_owned(),
        });
    }
    if path.is_empty() {
        return Err(DefinitionError::PathSyntax {
            path: path.to_owned(),
        });
    }

    let parts: Vec<&str> = path.split('.').collect();
    let mut segments = Vec::with_capacity(parts.len());
    let mut current = root.to_owned();

    for (i, part) in parts.iter().enumerate() {
        let caps = SEGMENT
            .captures(part)
            .ok_or_else(|| DefinitionError::PathSyntax {
                path: path.to_owned(),
            })?;
        let name = &caps[1];
        let hint = caps.get(2).map(|m| m.as_str().to_owned());

        let attr = reflector.attribute(&current, name).ok_or_else(|| {
            DefinitionError::UnknownAttribute {
                path: path.to_owned(),
                entity: current.clone(),
                attribute: name.to_owned(),
            }
        })?;
        let terminal = attr.is_terminal();
        let is_last = i + 1 == parts.len();

        if terminal && (!is_last || hint.is_some()) {
            return Err(DefinitionError::FieldLevel {
                path: path.to_owned(),
                segment: (*part).to_owned(),
            });
        }

        if let (Some(subtype), Some(target)) = (&hint, attr.value_type.entity()) {
            if reflector.entity(subtype).is_none() || !reflector.is_subtype(subtype, target) {
                return Err(DefinitionError::UnreachableSubtype {
                    path: path.to_owned(),
                    entity: target.to_owned(),
                    subtype: subtype.clone(),
                });
            }
        }

        let segment = PathSegment {
            name: name.to_owned(),
            kind: attr.kind,
            terminal,
            value_type: attr.value_type.clone(),
            owner: current.clone(),
            treat: hint,
        };
        if let Some(next) = segment.target() {
            current = next.to_owned();
        }
        segments.push(segment);
    }

    Ok(AttributePath {
        raw: path.to_owned(),
        segments,
    })
}
