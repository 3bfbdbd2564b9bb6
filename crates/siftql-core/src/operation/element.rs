//! Element strategies: comparisons against one terminal attribute.

use siftql_model::{ArrayFunction, CompareOp, Condition, FilterValue, Operand, Operation};

use super::like_pattern;

/// Inputs of one element strategy.
#[derive(Debug)]
pub struct ElementOperands<'a> {
    /// Resolved terminal attribute.
    pub operand: Operand,
    /// Coerced values for this path.
    pub values: &'a [FilterValue],
    /// Pattern matching is case-sensitive.
    pub case_sensitive: bool,
    /// The attribute is a native array column.
    pub array: bool,
}

/// A pure element strategy. `None` means the values do not fit the
/// operation, which binding already rules out.
pub type ElementStrategy = fn(ElementOperands<'_>) -> Option<Condition>;

/// Element strategy per operation.
pub const STRATEGIES: [(Operation, ElementStrategy); 19] = [
    (Operation::Eq, eq),
    (Operation::Ne, ne),
    (Operation::Gt, gt),
    (Operation::Gte, gte),
    (Operation::Lt, lt),
    (Operation::Lte, lte),
    (Operation::Between, between),
    (Operation::Regex, regex),
    (Operation::Like, like),
    (Operation::NotLike, not_like),
    (Operation::StartsWith, starts_with),
    (Operation::EndsWith, ends_with),
    (Operation::In, is_in),
    (Operation::NotIn, not_in),
    (Operation::IsNull, is_null),
    (Operation::Overlap, overlap),
    (Operation::NotOverlap, not_overlap),
    (Operation::Contained, contained),
    (Operation::NotContained, not_contained),
];

/// Looks up the element strategy of `operation`.
#[must_use]
pub fn strategy(operation: Operation) -> Option<ElementStrategy> {
    super::lookup(&STRATEGIES, operation)
}

fn compare(o: ElementOperands<'_>, op: CompareOp) -> Option<Condition> {
    Some(Condition::Compare {
        value: o.values.first()?.clone(),
        operand: o.operand,
        op,
    })
}

fn array(o: ElementOperands<'_>, function: ArrayFunction) -> Condition {
    Condition::Array {
        operand: o.operand,
        function,
        values: o.values.to_vec(),
    }
}

fn pattern(o: ElementOperands<'_>, operation: Operation) -> Option<Condition> {
    let literal = o.values.first()?.to_string();
    let (operand, literal) = if o.case_sensitive {
        (o.operand, literal)
    } else {
        (o.operand.lower(), literal.to_lowercase())
    };
    Some(Condition::Like {
        operand,
        pattern: like_pattern(operation, &literal),
    })
}

fn eq(o: ElementOperands<'_>) -> Option<Condition> {
    if o.array {
        return Some(array(o, ArrayFunction::Equals));
    }
    compare(o, CompareOp::Eq)
}

fn ne(o: ElementOperands<'_>) -> Option<Condition> {
    if o.array {
        return Some(array(o, ArrayFunction::Equals).negate());
    }
    compare(o, CompareOp::Ne)
}

fn gt(o: ElementOperands<'_>) -> Option<Condition> {
    compare(o, CompareOp::Gt)
}

fn gte(o: ElementOperands<'_>) -> Option<Condition> {
    compare(o, CompareOp::Ge)
}

fn lt(o: ElementOperands<'_>) -> Option<Condition> {
    compare(o, CompareOp::Lt)
}

fn lte(o: ElementOperands<'_>) -> Option<Condition> {
    compare(o, CompareOp::Le)
}

fn between(o: ElementOperands<'_>) -> Option<Condition> {
    let [low, high] = o.values else {
        return None;
    };
    Some(Condition::Between {
        low: low.clone(),
        high: high.clone(),
        operand: o.operand,
    })
}

fn regex(o: ElementOperands<'_>) -> Option<Condition> {
    Some(Condition::Regex {
        pattern: o.values.first()?.to_string(),
        operand: o.operand,
    })
}

fn like(o: ElementOperands<'_>) -> Option<Condition> {
    pattern(o, Operation::Like)
}

fn not_like(o: ElementOperands<'_>) -> Option<Condition> {
    pattern(o, Operation::Like).map(Condition::negate)
}

fn starts_with(o: ElementOperands<'_>) -> Option<Condition> {
    pattern(o, Operation::StartsWith)
}

fn ends_with(o: ElementOperands<'_>) -> Option<Condition> {
    pattern(o, Operation::EndsWith)
}

fn is_in(o: ElementOperands<'_>) -> Option<Condition> {
    if o.values.is_empty() {
        return None;
    }
    if o.array {
        return Some(array(o, ArrayFunction::Contains));
    }
    Some(Condition::In {
        values: o.values.to_vec(),
        operand: o.operand,
    })
}

fn not_in(o: ElementOperands<'_>) -> Option<Condition> {
    is_in(o).map(Condition::negate)
}

fn is_null(o: ElementOperands<'_>) -> Option<Condition> {
    let null = o.values.first()?.as_bool()?;
    Some(Condition::IsNull { operand: o.operand }.negate_if(!null))
}

fn overlap(o: ElementOperands<'_>) -> Option<Condition> {
    Some(array(o, ArrayFunction::Overlaps))
}

fn not_overlap(o: ElementOperands<'_>) -> Option<Condition> {
    overlap(o).map(Condition::negate)
}

fn contained(o: ElementOperands<'_>) -> Option<Condition> {
    Some(array(o, ArrayFunction::ContainedBy))
}

fn not_contained(o: ElementOperands<'_>) -> Option<Condition> {
    contained(o).map(Condition::negate)
}
