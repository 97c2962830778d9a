//! Predicate construction and document rendering
//!
//! A `Predicate` is one backend-agnostic field/operator/value condition.
//! Predicates over the same request always combine with logical AND; a
//! sequence value supplied for a parameter expands into one predicate per
//! element (still AND-combined, never OR; preserved wire behavior).

use std::collections::BTreeMap;

use serde_json::json;

use sift_core::{Error, FieldPath, Result, Value};

use crate::normalize::{normalize_parameter, normalize_value};
use crate::operator::Operator;

/// Raw parameter mapping as supplied by the request layer.
///
/// `None` values mark absent parameters; they never produce a predicate.
pub type RawParams = BTreeMap<String, Option<Value>>;

/// A single normalized field/operator/value condition.
///
/// `operator = None` denotes the exact-equality shorthand of a bare
/// parameter key.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: FieldPath,
    operator: Option<Operator>,
    value: Value,
}

impl Predicate {
    /// Build a predicate, enforcing operator/value arity.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a list operator receives a
    /// non-sequence value or a scalar operator receives a sequence; shape
    /// violations are never silently coerced.
    pub fn new(field: FieldPath, operator: Option<Operator>, value: Value) -> Result<Self> {
        match operator {
            Some(op) if op.is_list() => {
                if !value.is_array() {
                    return Err(Error::validation(
                        field.as_str(),
                        format!("operator '{op}' expects a sequence value"),
                    ));
                }
            }
            _ => {
                if value.is_array() {
                    let op = operator.map_or("eq", |op| op.as_token());
                    return Err(Error::validation(
                        field.as_str(),
                        format!("operator '{op}' expects a scalar value"),
                    ));
                }
            }
        }
        Ok(Predicate {
            field,
            operator,
            value,
        })
    }

    /// The addressed field path.
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    /// The operator, `None` for exact equality.
    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    /// The operator with the equality shorthand resolved.
    pub fn effective_operator(&self) -> Operator {
        self.operator.unwrap_or(Operator::Eq)
    }

    /// The normalized comparison value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Render the predicate as a document-store match expression.
    ///
    /// - equality shorthand: `{field: value}` with no operator wrapper
    /// - containment: `{field: {"$regex": ".*<escaped>.*"}}`, plus
    ///   `"$options": "i"` for the case-insensitive form; the user value is
    ///   escaped so it matches as a literal substring, never as a pattern
    /// - everything else: `{field: {"$op": value}}`
    pub fn to_document(&self) -> serde_json::Value {
        let field = self.field.as_str();
        match self.operator {
            None => json!({ field: serde_json::Value::from(self.value.clone()) }),
            Some(op) if op.is_contains() => {
                let pattern = format!(".*{}.*", escape_pattern(&render_plain(&self.value)));
                if op == Operator::IContains {
                    json!({ field: { "$regex": pattern, "$options": "i" } })
                } else {
                    json!({ field: { "$regex": pattern } })
                }
            }
            Some(op) => {
                json!({ field: { (op.render_tag()): serde_json::Value::from(self.value.clone()) } })
            }
        }
    }
}

/// Escape pattern metacharacters so a user value matches literally.
pub fn escape_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}

/// Build the predicates for one raw parameter.
///
/// The key is split per the suffix grammar, then the value is normalized
/// for the detected operator. A sequence value (repeated query key) expands
/// into one predicate per element, AND-combined.
///
/// # Errors
///
/// Returns a validation error naming the parameter on arity violations.
pub fn build_parameter_predicates(key: &str, value: &Value) -> Result<Vec<Predicate>> {
    let (field, operator) = normalize_parameter(key)?;

    let raw_values: Vec<&Value> = match value {
        Value::Array(elements) => elements.iter().collect(),
        single => vec![single],
    };

    raw_values
        .into_iter()
        .map(|raw| {
            let normalized = normalize_value(raw, operator);
            Predicate::new(field.clone(), operator, normalized)
                .map_err(|_| arity_error(key, operator))
        })
        .collect()
}

/// Normalize a whole parameter mapping into an AND-list of predicates.
///
/// Absent (`None`) values are dropped before normalization and never
/// produce a predicate.
///
/// # Errors
///
/// Aborts on the first arity mismatch, identifying the offending
/// parameter; it never silently drops a predicate.
pub fn collect_predicates(params: &RawParams) -> Result<Vec<Predicate>> {
    let mut predicates = Vec::new();
    for (key, value) in params {
        let Some(value) = value else { continue };
        predicates.extend(build_parameter_predicates(key, value)?);
    }
    Ok(predicates)
}

fn arity_error(key: &str, operator: Option<Operator>) -> Error {
    let op = operator.map_or("eq", |op| op.as_token());
    Error::validation(
        key,
        format!("value shape does not match arity of operator '{op}'"),
    )
}
