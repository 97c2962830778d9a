//! In-memory filter evaluation for the key-value backend
//!
//! Applies the filter operator semantics directly to decoded records
//! during a forward scan. The evaluator is a pure predicate: it never
//! mutates records and holds no state between calls.

use sift_core::{Error, FieldPath, Result, Value};
use sift_query::Operator;

/// Reject operators the evaluator does not implement.
///
/// Called once before a scan starts so an unsupported operator fails fast
/// rather than per-record. The supported set is `contains, exists, lt,
/// lte, eq, ne, gte, gt`.
///
/// # Errors
///
/// Returns `UnsupportedOperator` for `in`, `nin` and `icontains`.
pub fn check_operator(operator: Operator) -> Result<()> {
    match operator {
        Operator::In | Operator::Nin | Operator::IContains => Err(Error::UnsupportedOperator {
            operator: operator.as_token().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Evaluate one predicate against a decoded record.
///
/// - `contains`: the record's field must be a string or sequence
///   container; anything else (including an absent field) is treated as an
///   empty container and yields `false`
/// - `exists`: truthy check on the field's current value; the supplied
///   comparison value is ignored
/// - comparison operators: standard ordering between the stored value and
///   the supplied value; mismatched types fail the comparison rather than
///   coercing
///
/// # Errors
///
/// Returns `UnsupportedOperator` for operators outside the evaluator set.
pub fn matches(record: &Value, field: &FieldPath, value: &Value, operator: Operator) -> Result<bool> {
    check_operator(operator)?;

    let field_value = record.get_path(field);

    Ok(match operator {
        Operator::Contains => contains(field_value, value),
        Operator::Exists => field_value.is_some_and(Value::is_truthy),
        Operator::Eq => compare_is(field_value, value, |o| o.is_eq()),
        Operator::Ne => compare_is(field_value, value, |o| o.is_ne()),
        Operator::Lt => compare_is(field_value, value, |o| o.is_lt()),
        Operator::Lte => compare_is(field_value, value, |o| o.is_le()),
        Operator::Gt => compare_is(field_value, value, |o| o.is_gt()),
        Operator::Gte => compare_is(field_value, value, |o| o.is_ge()),
        Operator::In | Operator::Nin | Operator::IContains => unreachable!("rejected above"),
    })
}

fn contains(field_value: Option<&Value>, value: &Value) -> bool {
    match field_value {
        Some(Value::String(s)) => value.as_str().map(|needle| s.contains(needle)).unwrap_or(false),
        Some(Value::Array(elements)) => elements.iter().any(|element| element == value),
        // Non-container fields are treated as empty
        _ => false,
    }
}

fn compare_is(
    field_value: Option<&Value>,
    value: &Value,
    check: fn(std::cmp::Ordering) -> bool,
) -> bool {
    field_value
        .and_then(|fv| fv.compare(value))
        .map(check)
        .unwrap_or(false)
}
