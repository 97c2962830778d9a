//! Parameter and value normalization
//!
//! Turns a flat mapping of suffixed string keys (`age__gte`,
//! `name__icontains`) into field-path + operator + normalized-value triples.
//!
//! Key suffix grammar: `<field>[__<nested-field>]*[__<operator>]`, where the
//! recognized trailing operator tokens are exactly `gt, gte, lt, lte, in,
//! nin, contains, icontains`. Any other trailing token is a nested field
//! segment, so `address__city` addresses `address.city`.
//!
//! Known ambiguity: a field literally named with `__` whose final segment
//! coincides with an operator token cannot be addressed through this
//! grammar; the operator reading always wins. Callers with colliding names
//! must construct `Predicate`s directly.

use tracing::debug;

use sift_core::{Error, FieldPath, Result, Value};

use crate::operator::Operator;

/// The double-delimiter separating field segments and the operator suffix.
pub const PARAM_DELIMITER: &str = "__";

/// Split a suffixed parameter key into a field path and an operator.
///
/// No delimiter: the whole key is the field path, operator `None`
/// (exact-equality shorthand). With a delimiter, the final segment is
/// checked against the suffix grammar; unrecognized tokens turn every
/// `__` into a path separator instead.
///
/// # Errors
///
/// Returns a validation error naming the original key when the derived
/// field path is empty or has empty segments (`__gt`, `a____b`).
pub fn normalize_parameter(key: &str) -> Result<(FieldPath, Option<Operator>)> {
    debug!(parameter = key, "normalizing parameter");

    let (field, operator) = if key.contains(PARAM_DELIMITER) {
        let segments: Vec<&str> = key.split(PARAM_DELIMITER).collect();
        let last = segments[segments.len() - 1];
        match Operator::from_suffix(last) {
            Some(op) => {
                let field = FieldPath::from_segments(&segments[..segments.len() - 1])
                    .map_err(|_| bad_key(key))?;
                (field, Some(op))
            }
            None => {
                let field: FieldPath = key
                    .replace(PARAM_DELIMITER, ".")
                    .parse()
                    .map_err(|_| bad_key(key))?;
                (field, None)
            }
        }
    } else {
        (key.parse().map_err(|_| bad_key(key))?, None)
    };

    debug!(
        field = %field,
        operator = operator.map(|op| op.as_token()),
        "normalized parameter"
    );
    Ok((field, operator))
}

fn bad_key(key: &str) -> Error {
    Error::validation(key, "parameter key yields an empty field segment")
}

/// Normalize a raw parameter value for the given operator.
///
/// - Temporal values render to ISO 8601 with a literal `Z` suffix; this
///   takes precedence over list wrapping.
/// - For list operators, a comma-bearing string splits into a sequence of
///   scalar strings; any other value wraps as a one-element sequence
///   unchanged.
/// - Everything else passes through.
pub fn normalize_value(value: &Value, operator: Option<Operator>) -> Value {
    if let Value::DateTime(dt) = value {
        return Value::String(Value::iso8601_z(dt));
    }

    if operator.is_some_and(|op| op.is_list()) {
        return normalize_list_value(value);
    }

    value.clone()
}

fn normalize_list_value(value: &Value) -> Value {
    if let Value::String(s) = value {
        if s.contains(',') {
            return Value::Array(s.split(',').map(|part| Value::String(part.into())).collect());
        }
    }
    Value::Array(vec![value.clone()])
}
