//! JSON value helpers: form-string coercion and the total order used for sorting.

use crate::model::FieldType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// One persisted instance, keyed by field name.
pub type Record = serde_json::Map<String, Value>;

/// Coerces a raw string (form field, path segment) to the field's declared type.
/// Returns `None` when the string cannot represent that type.
pub fn coerce_str(field_type: FieldType, s: &str) -> Option<Value> {
    match field_type {
        FieldType::String => Some(Value::String(s.to_string())),
        FieldType::Integer => s.trim().parse::<i64>().ok().map(Value::from),
        FieldType::Float => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldType::Boolean => {
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Some(Value::Bool(true))
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        FieldType::Uuid => canonical_uuid(s).map(Value::String),
        FieldType::Timestamp => parse_timestamp(s).map(|t| Value::String(canonical_timestamp(&t))),
    }
}

/// Hyphenated lowercase form.
pub fn canonical_uuid(s: &str) -> Option<String> {
    uuid::Uuid::parse_str(s).ok().map(|u| u.to_string())
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

/// UTC with fixed microsecond precision, so string order is instant order.
pub fn canonical_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Rewrites uuid and timestamp strings into their canonical form. Other
/// values come back unchanged.
pub fn canonicalize(field_type: FieldType, value: Value) -> Value {
    let Value::String(s) = &value else { return value };
    let canonical = match field_type {
        FieldType::Uuid => canonical_uuid(s),
        FieldType::Timestamp => parse_timestamp(s).map(|t| canonical_timestamp(&t)),
        _ => None,
    };
    canonical.map(Value::String).unwrap_or(value)
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
/// Integers compare exactly; mixed integer/float compare as f64.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => {
                let (fx, fy) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
                fx.partial_cmp(&fy).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
