//! Model types for siftql.
//!
//! This crate holds the data shared between the filter engine and its host:
//! operations and sort directions, the entity schema descriptor, the raw
//! filter-shape metadata, the condition tree produced for the host query
//! layer, and the error taxonomy.

pub mod condition;
pub mod error;
pub mod operation;
pub mod schema;
pub mod shape;
pub mod value;

pub use condition::{
    ArrayFunction, AttributeRef, CompareOp, Condition, FilterQuery, Join, JoinAlias, JoinKind,
    Operand, SortInstruction,
};
pub use error::{DefinitionError, FilterError, FilterErrorCode, RequiredPhase};
pub use operation::{Direction, Operation};
pub use schema::{AttributeDescriptor, EntityDescriptor, RelationKind, SchemaCatalog, SchemaReflector};
pub use shape::{
    CollectionSpec, DefaultSpec, DiscriminatorSpec, ElementSpec, FieldSpec, FilterShape, JsonSpec,
    PathCombination, PredicateSpec, RequiredSpec, SortSpec, SortableSpec,
};
pub use value::{FilterValue, ValueType};
