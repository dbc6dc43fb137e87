//! Lenient conversions for loosely typed JSON payload fields
//!
//! Clients send numbers as JSON numbers or as strings. `null` and the empty
//! string both mean "no value". Anything else that does not parse is an
//! [`InvalidNumber`] so callers decide whether to store `null` or drop the key.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot convert {0} to a number")]
pub struct InvalidNumber(pub String);

/// Numeric column kinds accepted by the inventory and patient tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
}

impl NumericKind {
    pub fn coerce(self, value: &Value) -> Result<Value, InvalidNumber> {
        match self {
            NumericKind::Integer => to_int(value).map(|n| n.map(Value::from).unwrap_or(Value::Null)),
            NumericKind::Float => to_float(value).map(|n| {
                n.and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Integer conversion; fractional numbers truncate toward zero, numeric
/// strings must be integral
pub fn to_int(value: &Value) -> Result<Option<i64>, InvalidNumber> {
    if is_blank(value) {
        return Ok(None);
    }
    match value {
        Value::Bool(b) => Ok(Some(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.trunc() as i64)),
                _ => Err(InvalidNumber(n.to_string())),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| InvalidNumber(s.clone())),
        other => Err(InvalidNumber(other.to_string())),
    }
}

/// Floating point conversion; numeric strings may carry surrounding whitespace
pub fn to_float(value: &Value) -> Result<Option<f64>, InvalidNumber> {
    if is_blank(value) {
        return Ok(None);
    }
    match value {
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| InvalidNumber(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| InvalidNumber(s.clone())),
        other => Err(InvalidNumber(other.to_string())),
    }
}

/// Truthiness: null, false, zero, empty strings and empty containers are false
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Text form of a scalar used for equality lookups
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First truthy value among `keys`, rendered as text
pub fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .map(|key| map.get(*key))
        .find(|value| truthy(*value))
        .flatten()
        .map(value_text)
}

/// Copy the keys present in `source` among `allowed`, preserving their raw values
pub fn present_fields(source: &Map<String, Value>, allowed: &[&str]) -> Map<String, Value> {
    allowed
        .iter()
        .filter_map(|key| source.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// Coerce numeric columns of an update in place, dropping the ones that do not parse
pub fn coerce_or_drop(updates: &mut Map<String, Value>, columns: &[(&str, NumericKind)]) {
    for (column, kind) in columns {
        let Some(raw) = updates.get(*column) else {
            continue;
        };
        match kind.coerce(raw) {
            Ok(value) => {
                updates.insert(column.to_string(), value);
            }
            Err(_) => {
                updates.remove(*column);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_conversion_follows_lenient_rules() {
        assert_eq!(to_int(&json!(42)).unwrap(), Some(42));
        assert_eq!(to_int(&json!(3.9)).unwrap(), Some(3));
        assert_eq!(to_int(&json!(" 17 ")).unwrap(), Some(17));
        assert_eq!(to_int(&json!("")).unwrap(), None);
        assert_eq!(to_int(&Value::Null).unwrap(), None);
        assert!(to_int(&json!("3.7")).is_err());
        assert!(to_int(&json!("abc")).is_err());
        assert!(to_int(&json!([1])).is_err());
    }

    #[test]
    fn float_conversion_accepts_strings() {
        assert_eq!(to_float(&json!("72.5")).unwrap(), Some(72.5));
        assert_eq!(to_float(&json!(180)).unwrap(), Some(180.0));
        assert!(to_float(&json!("tall")).is_err());
    }

    #[test]
    fn truthiness_matches_payload_conventions() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(null))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(false))));
        assert!(truthy(Some(&json!("0"))));
        assert!(truthy(Some(&json!(30))));
    }

    #[test]
    fn first_text_skips_falsy_aliases() {
        let map = json!({"Phonenumber": "", "phone": 9876543210_i64});
        let map = map.as_object().unwrap();
        assert_eq!(
            first_text(map, &["Phonenumber", "phone"]),
            Some("9876543210".to_string())
        );
    }

    #[test]
    fn unparseable_update_fields_are_dropped() {
        let source = json!({"Age": "old", "Weight": "70.5", "Name": "Ravi", "Unknown": 1});
        let mut updates = present_fields(source.as_object().unwrap(), &["Name", "Age", "Weight"]);
        coerce_or_drop(
            &mut updates,
            &[("Age", NumericKind::Integer), ("Weight", NumericKind::Float)],
        );
        assert!(!updates.contains_key("Age"));
        assert_eq!(updates["Weight"], json!(70.5));
        assert_eq!(updates["Name"], json!("Ravi"));
        assert!(!updates.contains_key("Unknown"));
    }
}
