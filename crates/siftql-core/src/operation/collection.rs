//! Collection strategies: cardinality comparisons.

use siftql_model::{AttributeRef, CompareOp, Condition, Operation};

/// Comparison operator per collection operation.
pub const OPERATORS: [(Operation, CompareOp); 6] = [
    (Operation::Eq, CompareOp::Eq),
    (Operation::Ne, CompareOp::Ne),
    (Operation::Gt, CompareOp::Gt),
    (Operation::Gte, CompareOp::Ge),
    (Operation::Lt, CompareOp::Lt),
    (Operation::Lte, CompareOp::Le),
];

/// Compares the size of `collection` with `size`.
#[must_use]
pub fn resolve(operation: Operation, collection: AttributeRef, size: i64) -> Option<Condition> {
    let op = super::lookup(&OPERATORS, operation)?;
    Some(Condition::Size {
        collection,
        op,
        value: size,
    })
}
