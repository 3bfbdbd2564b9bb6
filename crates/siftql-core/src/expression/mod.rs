//! Boolean expressions over names and path placeholders.
//!
//! Used by named predicates (`author AND (title OR summary)`) and by the
//! custom combination of multi-path element fields (`$1 OR ($2 AND $3)`).
//! Expressions are parsed once, when the registry is built, and reduced to a
//! [`Condition`](siftql_model::Condition) at every build.

pub mod ast;
pub mod parser;

pub use ast::{BoolExpr, Leaf};
pub use parser::{ExpressionError, parse_expression};

/// Checks that every field name of `expr` is known.
///
/// # Errors
///
/// Returns [`ExpressionError::UnknownName`] for the first unknown name.
pub fn check_names(expr: &BoolExpr, known: impl Fn(&str) -> bool) -> Result<(), ExpressionError> {
    match expr.names().into_iter().find(|name| !known(name)) {
        Some(name) => Err(ExpressionError::UnknownName {
            name: name.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Checks that `expr` only uses placeholders within `1..=count`.
///
/// # Errors
///
/// Returns [`ExpressionError::UnknownName`] for a field name or an
/// out-of-range placeholder.
pub fn check_placeholders(expr: &BoolExpr, count: usize) -> Result<(), ExpressionError> {
    if let Some(name) = expr.names().into_iter().next() {
        return Err(ExpressionError::UnknownName {
            name: name.to_owned(),
        });
    }
    match expr.placeholders().into_iter().find(|n| *n > count) {
        Some(n) => Err(ExpressionError::UnknownName {
            name: format!("${n}"),
        }),
        None => Ok(()),
    }
}
