//! JSON strategies: one condition per extracted key, combined with AND.

use siftql_model::{AttributeRef, CompareOp, Condition, FilterValue, Operand, Operation};

use super::like_pattern;

/// A pure per-key JSON strategy over `(key text, literal)`.
pub type JsonStrategy = fn(Operand, &str) -> Condition;

/// JSON strategy per operation.
pub const STRATEGIES: [(Operation, JsonStrategy); 5] = [
    (Operation::Eq, eq),
    (Operation::Ne, ne),
    (Operation::Like, like),
    (Operation::StartsWith, starts_with),
    (Operation::EndsWith, ends_with),
];

/// Builds the conjunction of one condition per `(key, value)` pair.
///
/// Returns `None` when `operation` has no JSON strategy or `pairs` is empty.
#[must_use]
pub fn resolve(
    operation: Operation,
    column: &AttributeRef,
    pairs: &[(String, String)],
    case_sensitive: bool,
) -> Option<Condition> {
    let strategy = super::lookup(&STRATEGIES, operation)?;
    let conditions = pairs
        .iter()
        .map(|(key, value)| {
            let operand = Operand::JsonText {
                column: column.clone(),
                key: key.clone(),
            };
            if case_sensitive {
                strategy(operand, value)
            } else {
                strategy(operand.lower(), &value.to_lowercase())
            }
        })
        .collect();
    Condition::all(conditions)
}

fn eq(operand: Operand, value: &str) -> Condition {
    Condition::Compare {
        operand,
        op: CompareOp::Eq,
        value: FilterValue::Text(value.to_owned()),
    }
}

fn ne(operand: Operand, value: &str) -> Condition {
    Condition::Compare {
        operand,
        op: CompareOp::Ne,
        value: FilterValue::Text(value.to_owned()),
    }
}

fn like(operand: Operand, value: &str) -> Condition {
    Condition::Like {
        operand,
        pattern: like_pattern(Operation::Like, value),
    }
}

fn starts_with(operand: Operand, value: &str) -> Condition {
    Condition::Like {
        operand,
        pattern: like_pattern(Operation::StartsWith, value),
    }
}

fn ends_with(operand: Operand, value: &str) -> Condition {
    Condition::Like {
        operand,
        pattern: like_pattern(Operation::EndsWith, value),
    }
}
