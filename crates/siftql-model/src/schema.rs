//! Host-supplied entity schema descriptor.
//!
//! Discovering the schema (reflection, annotations, database metadata) is the
//! host's job. The engine only consumes the result through [`SchemaReflector`].
//! [`SchemaCatalog`] is a plain, serde-loadable implementation.

use serde::{Deserialize, Serialize};

use crate::condition::JoinKind;
use crate::value::ValueType;

/// How an attribute relates to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Single-valued attribute or to-one relationship.
    #[default]
    Scalar,
    /// Ordered multi-valued relationship.
    List,
    /// Unordered multi-valued relationship.
    Set,
    /// Enumerated attribute.
    Enum,
}

impl RelationKind {
    /// Returns `true` for list and set relations.
    #[must_use]
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }

    /// Join kind used for this relation when none is configured: to-one
    /// relations are optional (left), multi-valued ones are inner.
    #[must_use]
    pub fn natural_join(self) -> JoinKind {
        if self.is_multi_valued() {
            JoinKind::Inner
        } else {
            JoinKind::Left
        }
    }
}

/// One attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    /// Attribute name.
    pub name: String,
    /// Relation kind.
    #[serde(default)]
    pub kind: RelationKind,
    /// Value type; `entity` for relationships.
    pub value_type: ValueType,
}

impl AttributeDescriptor {
    /// Creates a scalar attribute.
    #[must_use]
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        let kind = if matches!(value_type, ValueType::Enum(_)) {
            RelationKind::Enum
        } else {
            RelationKind::Scalar
        };
        Self {
            name: name.into(),
            kind,
            value_type,
        }
    }

    /// Creates a relationship attribute to `target`.
    #[must_use]
    pub fn relation(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value_type: ValueType::Entity(target.into()),
        }
    }

    /// A terminal attribute holds a directly comparable value.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.value_type.entity().is_none()
    }
}

/// One entity of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    /// Entity name.
    pub name: String,
    /// Supertype, if this entity is part of a polymorphic hierarchy.
    #[serde(default)]
    pub parent: Option<String>,
    /// Attributes declared directly on this entity.
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
}

impl EntityDescriptor {
    /// Creates an entity without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            attributes: Vec::new(),
        }
    }

    /// Sets the supertype.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Read access to the entity schema.
pub trait SchemaReflector {
    /// Looks up an entity by name.
    fn entity(&self, name: &str) -> Option<&EntityDescriptor>;

    /// Looks up an attribute on `entity` or any of its supertypes.
    fn attribute(&self, entity: &str, name: &str) -> Option<&AttributeDescriptor> {
        let mut current = self.entity(entity);
        let mut hops = 0usize;
        while let Some(descriptor) = current {
            if let Some(attr) = descriptor.attributes.iter().find(|a| a.name == name) {
                return Some(attr);
            }
            hops += 1;
            if hops > MAX_HIERARCHY_DEPTH {
                return None;
            }
            current = descriptor.parent.as_deref().and_then(|p| self.entity(p));
        }
        None
    }

    /// Returns `true` when `sub` is `sup` or inherits from it.
    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut current = self.entity(sub);
        let mut hops = 0usize;
        while let Some(descriptor) = current {
            if descriptor.name == sup {
                return true;
            }
            hops += 1;
            if hops > MAX_HIERARCHY_DEPTH {
                return false;
            }
            current = descriptor.parent.as_deref().and_then(|p| self.entity(p));
        }
        false
    }
}

/// Guards supertype walks against malformed (cyclic) hierarchies.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// An in-memory schema catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// All entities.
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity.
    #[must_use]
    pub fn with(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }
}

impl SchemaReflector for SchemaCatalog {
    fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }
}
