//! Match engine: binds raw values to field definitions and coerces them.

pub mod coercion;
pub mod matcher;

pub use coercion::coerce;
pub use matcher::{ExpressionEvaluator, FieldValue, Match, check_operation};
pub(crate) use matcher::{Bound, element_supports};
