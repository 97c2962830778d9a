//! Value types for siftdb
//!
//! This module defines:
//! - Value: Unified enum for everything that flows through the query layer
//!   (raw parameter values, normalized predicate values, decoded records)
//!
//! ## Type Rules
//!
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)` - different types are NEVER equal
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - Ordering comparisons (`compare`) are defined within a single type only;
//!   a mismatched pair yields `None`, it never coerces
//!
//! `DateTime` is the one deliberate exception: the normalizer renders
//! temporal values to ISO-8601 strings with a `Z` suffix, so stored records
//! hold strings where parameters hold timestamps. `compare` therefore
//! accepts a `DateTime`/`String` pair when the string parses as RFC 3339.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::path::FieldPath;

/// Canonical siftdb value type for all API surfaces
///
/// ## Type Equality
///
/// Different types are NEVER equal, even if they contain the same "value":
/// - `Int(1) != Float(1.0)`
/// - `String("true") != Bool(true)`
///
/// Float equality follows IEEE-754 semantics:
/// - `NaN != NaN`
/// - `-0.0 == 0.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// UTC timestamp; naive inputs are assumed UTC by construction
    DateTime(DateTime<Utc>),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys, ordered for deterministic encoding
    Object(BTreeMap<String, Value>),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // Different types are NEVER equal
            _ => false,
        }
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a string value
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this is an array value
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this is an object value
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &BTreeMap if this is an Object value
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Render a UTC timestamp as ISO 8601 with a literal `Z` suffix.
    ///
    /// The output never carries a numeric offset (`+00:00`).
    pub fn iso8601_z(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Ordering comparison between two values of the same type.
    ///
    /// Returns `None` for mismatched types (no coercion) and for types
    /// without a defined order (Null, Array, Object). Floats follow IEEE-754
    /// partial ordering, so `NaN` compares as `None`.
    ///
    /// A `DateTime` compares against a `String` that parses as RFC 3339;
    /// stored records hold the normalizer's string rendering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::String(s)) => parse_utc(s).map(|b| a.cmp(&b)),
            (Value::String(s), Value::DateTime(b)) => parse_utc(s).map(|a| a.cmp(b)),
            _ => None,
        }
    }

    /// Truthiness check used by the `exists` operator.
    ///
    /// Absent, null, false, zero, empty string and empty containers all
    /// count as non-existent.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::DateTime(_) => true,
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    /// Resolve a dot-separated field path against this value.
    ///
    /// Each segment descends into an Object attribute; a missing attribute
    /// or a non-object intermediate yields `None`.
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = self;
        for segment in path.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(o: BTreeMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

// ============================================================================
// serde_json interop: the wire format for both backends is JSON
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    // Fallback for u64 that doesn't fit in i64
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            // Temporal values always render with the Z suffix
            Value::DateTime(dt) => serde_json::Value::String(Value::iso8601_z(&dt)),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_int_not_equal_float() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_nan_not_equal_nan() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_compare_same_type() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::String("b".into()).compare(&Value::String("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Float(1.5).compare(&Value::Float(1.5)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_mismatched_types_is_none() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.0)), None);
        assert_eq!(Value::Int(1).compare(&Value::String("1".into())), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_compare_nan_is_none() {
        assert_eq!(Value::Float(f64::NAN).compare(&Value::Float(1.0)), None);
    }

    #[test]
    fn test_compare_datetime_against_rendered_string() {
        let early = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let stored = Value::String(Value::iso8601_z(&late));
        assert_eq!(
            Value::DateTime(early).compare(&stored),
            Some(Ordering::Less)
        );
        assert_eq!(
            stored.compare(&Value::DateTime(early)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_datetime_against_garbage_string_is_none() {
        let dt = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Value::DateTime(dt).compare(&Value::String("not a date".into())),
            None
        );
    }

    #[test]
    fn test_iso8601_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2023, 5, 17, 8, 45, 30).unwrap();
        let rendered = Value::iso8601_z(&dt);
        assert!(rendered.ends_with('Z'));
        assert!(!rendered.contains("+00:00"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Object(BTreeMap::new()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn test_get_path_flat() {
        let record = obj(&[("name", Value::String("bob".into()))]);
        let path: FieldPath = "name".parse().unwrap();
        assert_eq!(record.get_path(&path), Some(&Value::String("bob".into())));
    }

    #[test]
    fn test_get_path_nested() {
        let record = obj(&[("address", obj(&[("city", Value::String("lyon".into()))]))]);
        let path: FieldPath = "address.city".parse().unwrap();
        assert_eq!(record.get_path(&path), Some(&Value::String("lyon".into())));
    }

    #[test]
    fn test_get_path_missing_or_non_object() {
        let record = obj(&[("age", Value::Int(7))]);
        let missing: FieldPath = "name".parse().unwrap();
        assert_eq!(record.get_path(&missing), None);
        let through_scalar: FieldPath = "age.years".parse().unwrap();
        assert_eq!(record.get_path(&through_scalar), None);
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let json = serde_json::json!({"a": [1, 2, "three"], "b": null, "c": 1.5});
        let v: Value = json.clone().into();
        assert!(v.is_object());
        let back: serde_json::Value = v.into();
        assert_eq!(back, json);
    }

    #[test]
    fn test_serde_json_datetime_renders_z() {
        let dt = Utc.with_ymd_and_hms(2023, 5, 17, 8, 45, 30).unwrap();
        let json: serde_json::Value = Value::DateTime(dt).into();
        let s = json.as_str().unwrap();
        assert!(s.ends_with('Z'));
    }

    #[test]
    fn test_serde_json_u64_overflow_becomes_float() {
        let json = serde_json::json!(u64::MAX);
        let v: Value = json.into();
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Null.type_name(), "Null");
        assert_eq!(Value::Int(1).type_name(), "Int");
        assert_eq!(Value::Array(vec![]).type_name(), "Array");
    }
}
