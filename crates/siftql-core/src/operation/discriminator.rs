//! Discriminator strategies: runtime concrete type tests.

use siftql_model::{Condition, JoinAlias, Operation};

/// A pure discriminator strategy over the tested join and the selected
/// concrete entity names.
pub type DiscriminatorStrategy = fn(JoinAlias, Vec<String>) -> Condition;

/// Discriminator strategy per operation.
pub const STRATEGIES: [(Operation, DiscriminatorStrategy); 4] = [
    (Operation::Eq, type_is),
    (Operation::In, type_is),
    (Operation::Ne, type_is_not),
    (Operation::NotIn, type_is_not),
];

/// Builds the type test of `operation`, `None` for non-discriminator
/// operations.
#[must_use]
pub fn resolve(operation: Operation, alias: JoinAlias, types: Vec<String>) -> Option<Condition> {
    super::lookup(&STRATEGIES, operation).map(|strategy| strategy(alias, types))
}

fn type_is(alias: JoinAlias, types: Vec<String>) -> Condition {
    Condition::TypeIs { alias, types }
}

fn type_is_not(alias: JoinAlias, types: Vec<String>) -> Condition {
    type_is(alias, types).negate()
}
