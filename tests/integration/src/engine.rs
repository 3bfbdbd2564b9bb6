//! In-memory host execution engine.
//!
//! Evaluates a [`FilterQuery`] against JSON rows the way a relational host
//! would run it: plain joins expand each root row into one binding per
//! related row (inner joins drop rows without a match, left and fetch joins
//! bind `null`), existence joins are expanded only inside their
//! [`Condition::Exists`], and a root row is selected when any of its
//! bindings satisfies the condition. Logic is two-valued: comparisons
//! against `null` are false and `NOT` simply negates.
//!
//! Relationships are nested objects (to-one) or arrays of objects (to-many).
//! The concrete type of an entity is read from its `__type` key.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use siftql_model::{
    ArrayFunction, AttributeRef, CompareOp, Condition, Direction, FilterQuery, FilterValue,
    JoinAlias, JoinKind, Operand,
};

/// Key holding the concrete entity type of a row or related object.
pub const TYPE_KEY: &str = "__type";

static NULL: Value = Value::Null;

/// Aliases bound to the row they currently point at.
type Binding<'a> = BTreeMap<JoinAlias, &'a Value>;

/// Runs `query` over `rows`, returning the selected rows in query order.
#[must_use]
pub fn execute<'a>(query: &FilterQuery, rows: &'a [Value]) -> Vec<&'a Value> {
    let mut selected: Vec<(&Value, Vec<Value>)> = rows
        .iter()
        .filter_map(|row| {
            let bindings = expand(query, vec![Binding::from([(JoinAlias::ROOT, row)])], None);
            let hit = bindings.iter().find(|binding| {
                query
                    .condition
                    .as_ref()
                    .is_none_or(|condition| evaluate(query, condition, binding))
            })?;
            let keys = query
                .ordering
                .iter()
                .map(|sort| attribute(hit, &sort.attribute).clone())
                .collect();
            Some((row, keys))
        })
        .collect();

    selected.sort_by(|(_, a), (_, b)| {
        query
            .ordering
            .iter()
            .zip(a.iter().zip(b))
            .map(|(sort, (x, y))| compare_sort_keys(x, y, sort.direction))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    debug!(
        entity = %query.entity,
        rows = rows.len(),
        selected = selected.len(),
        "query executed"
    );
    selected.into_iter().map(|(row, _)| row).collect()
}

/// Runs `query` and returns the `id` of every selected row.
#[must_use]
pub fn execute_ids(query: &FilterQuery, rows: &[Value]) -> Vec<i64> {
    execute(query, rows)
        .into_iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

/// Nearest existence join at or above `alias`.
fn exists_root(query: &FilterQuery, mut alias: JoinAlias) -> Option<JoinAlias> {
    while let Some(join) = query.join(alias) {
        if join.kind == JoinKind::Exists {
            return Some(alias);
        }
        alias = join.parent;
    }
    None
}

/// Objects reached through `attribute` of `parent`.
fn related<'a>(parent: &'a Value, attribute: &str) -> Vec<&'a Value> {
    match parent.get(attribute) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

/// Applies the plain joins scoped under `scope` (`None` for the top level).
fn expand<'a>(
    query: &FilterQuery,
    mut bindings: Vec<Binding<'a>>,
    scope: Option<JoinAlias>,
) -> Vec<Binding<'a>> {
    for join in &query.joins {
        if join.kind == JoinKind::Exists || exists_root(query, join.alias) != scope {
            continue;
        }
        bindings = bindings
            .into_iter()
            .flat_map(|binding| {
                let parent = binding.get(&join.parent).copied().unwrap_or(&NULL);
                let targets = related(parent, &join.attribute);
                if targets.is_empty() {
                    if join.kind.is_inner() {
                        return Vec::new();
                    }
                    let mut binding = binding;
                    binding.insert(join.alias, &NULL);
                    return vec![binding];
                }
                targets
                    .into_iter()
                    .map(|target| {
                        let mut next = binding.clone();
                        next.insert(join.alias, target);
                        next
                    })
                    .collect()
            })
            .collect();
    }
    bindings
}

fn attribute<'a>(binding: &Binding<'a>, attr: &AttributeRef) -> &'a Value {
    binding
        .get(&attr.alias)
        .and_then(|row| row.get(&attr.attribute))
        .unwrap_or(&NULL)
}

fn operand_value(binding: &Binding<'_>, operand: &Operand) -> Value {
    match operand {
        Operand::Attribute(attr) => attribute(binding, attr).clone(),
        Operand::Lower { operand } => match operand_value(binding, operand) {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        },
        Operand::JsonText { column, key } => match attribute(binding, column).get(key) {
            None | Some(Value::Null) => Value::Null,
            Some(Value::String(s)) => Value::String(s.clone()),
            Some(other) => Value::String(other.to_string()),
        },
    }
}

fn evaluate(query: &FilterQuery, condition: &Condition, binding: &Binding<'_>) -> bool {
    match condition {
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(query, c, binding)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(query, c, binding)),
        Condition::Not { condition } => !evaluate(query, condition, binding),
        Condition::Compare { operand, op, value } => {
            compare(&operand_value(binding, operand), value).is_some_and(|o| holds(*op, o))
        }
        Condition::Between { operand, low, high } => {
            let actual = operand_value(binding, operand);
            compare(&actual, low).is_some_and(Ordering::is_ge)
                && compare(&actual, high).is_some_and(Ordering::is_le)
        }
        Condition::Like { operand, pattern } => {
            let actual = operand_value(binding, operand);
            match (actual.as_str(), like_regex(pattern)) {
                (Some(text), Some(re)) => re.is_match(text),
                _ => false,
            }
        }
        Condition::Regex { operand, pattern } => {
            let actual = operand_value(binding, operand);
            match (actual.as_str(), Regex::new(pattern)) {
                (Some(text), Ok(re)) => re.is_match(text),
                _ => false,
            }
        }
        Condition::In { operand, values } => {
            let actual = operand_value(binding, operand);
            values.iter().any(|v| compare(&actual, v) == Some(Ordering::Equal))
        }
        Condition::IsNull { operand } => operand_value(binding, operand).is_null(),
        Condition::Array {
            operand,
            function,
            values,
        } => {
            let actual = operand_value(binding, operand);
            let Some(items) = actual.as_array() else {
                return false;
            };
            evaluate_array(items, *function, values)
        }
        Condition::TypeIs { alias, types } => binding
            .get(alias)
            .and_then(|row| row.get(TYPE_KEY))
            .and_then(Value::as_str)
            .is_some_and(|concrete| types.iter().any(|t| t == concrete)),
        Condition::Size {
            collection,
            op,
            value,
        } => {
            let size = attribute(binding, collection).as_array().map_or(0, Vec::len);
            i64::try_from(size).is_ok_and(|size| holds(*op, size.cmp(value)))
        }
        Condition::Exists { alias, condition } => {
            let Some(join) = query.join(*alias) else {
                return false;
            };
            let parent = binding.get(&join.parent).copied().unwrap_or(&NULL);
            related(parent, &join.attribute).into_iter().any(|target| {
                let mut scoped = binding.clone();
                scoped.insert(*alias, target);
                expand(query, vec![scoped], Some(*alias))
                    .iter()
                    .any(|inner| evaluate(query, condition, inner))
            })
        }
    }
}

fn evaluate_array(items: &[Value], function: ArrayFunction, values: &[FilterValue]) -> bool {
    let contains = |value: &FilterValue| {
        items
            .iter()
            .any(|item| compare(item, value) == Some(Ordering::Equal))
    };
    let listed = |item: &Value| {
        values
            .iter()
            .any(|value| compare(item, value) == Some(Ordering::Equal))
    };
    match function {
        ArrayFunction::Equals => values.iter().all(contains) && items.iter().all(listed),
        ArrayFunction::Contains => values.iter().all(contains),
        ArrayFunction::Overlaps => values.iter().any(contains),
        ArrayFunction::ContainedBy => items.iter().all(listed),
    }
}

fn holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
    }
}

/// Orders a stored JSON value against a typed filter value; `None` when
/// they are not comparable (including `null`).
fn compare(actual: &Value, expected: &FilterValue) -> Option<Ordering> {
    match expected {
        FilterValue::Text(s) | FilterValue::Enum(s) => Some(actual.as_str()?.cmp(s.as_str())),
        FilterValue::Integer(n) => Some(actual.as_i64()?.cmp(n)),
        FilterValue::Float(f) => actual.as_f64()?.partial_cmp(f),
        FilterValue::Boolean(b) => Some(actual.as_bool()?.cmp(b)),
        FilterValue::Date(d) => Some(actual.as_str()?.parse::<NaiveDate>().ok()?.cmp(d)),
        FilterValue::DateTime(d) => Some(actual.as_str()?.parse::<NaiveDateTime>().ok()?.cmp(d)),
        FilterValue::Time(t) => Some(actual.as_str()?.parse::<NaiveTime>().ok()?.cmp(t)),
        FilterValue::Uuid(u) => Some(actual.as_str()?.cmp(u.to_string().as_str())),
    }
}

/// Sort order of stored values in `direction`; nulls sort last either way.
fn compare_sort_keys(a: &Value, b: &Value, direction: Direction) -> Ordering {
    let ordering = match (a, b) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Greater,
        (_, Value::Null) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    };
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

/// Translates a `LIKE` pattern (`%`, `_`, `\` escapes) into an anchored regex.
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_translate_like_patterns() {
        let re = like_regex("%50\\%_").unwrap();
        assert!(re.is_match("save 50%!"));
        assert!(!re.is_match("save 50!"));
        assert!(like_regex("ab%").unwrap().is_match("abc"));
        assert!(!like_regex("ab%").unwrap().is_match("cab"));
    }

    #[test]
    fn test_should_compare_typed_values() {
        assert_eq!(
            compare(&json!("2024-01-02"), &FilterValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
            Some(Ordering::Greater)
        );
        assert_eq!(compare(&json!(3), &FilterValue::Integer(3)), Some(Ordering::Equal));
        assert_eq!(compare(&Value::Null, &FilterValue::Integer(3)), None);
    }

    #[test]
    fn test_should_evaluate_array_functions() {
        let items = [json!("A"), json!("B")];
        let values = |v: &[&str]| {
            v.iter()
                .map(|s| FilterValue::Text((*s).to_owned()))
                .collect::<Vec<_>>()
        };
        assert!(evaluate_array(&items, ArrayFunction::Equals, &values(&["B", "A", "A"])));
        assert!(evaluate_array(&items, ArrayFunction::Contains, &values(&["A"])));
        assert!(evaluate_array(&items, ArrayFunction::Overlaps, &values(&["C", "B"])));
        assert!(!evaluate_array(&items, ArrayFunction::ContainedBy, &values(&["A"])));
        assert!(evaluate_array(&items, ArrayFunction::ContainedBy, &values(&["A", "B", "C"])));
    }
}
