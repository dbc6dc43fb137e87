use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Column holding the store-assigned row identifier
pub const ROW_ID: &str = "ROWID";

/// Column holding the store-assigned creation timestamp
pub const CREATED_TIME: &str = "CREATEDTIME";

/// Alternate spellings some store responses use for the row identifier
const ROW_ID_ALIASES: [&str; 4] = [ROW_ID, "id", "Id", "ROW_ID"];

/// Store-assigned row identifier
///
/// The store reports row ids either as JSON numbers or as strings, and
/// clients send them back either way. Both forms deserialize into the same
/// textual representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Read a row id from an arbitrary JSON value, ignoring empty strings
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RowId::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("row id must be a non-empty string or a number"))
    }
}

/// A single table row as the store returns it: column name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style setter
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.0.insert(column.into(), value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// String value of a column, if it holds a string
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Store-assigned identifier, trying each spelling the store is known to use
    pub fn row_id(&self) -> Option<RowId> {
        ROW_ID_ALIASES
            .iter()
            .find_map(|key| self.0.get(*key).and_then(RowId::from_value))
    }

    /// Keep only the listed columns
    pub fn project(&self, columns: &[String]) -> Row {
        let mut projected = Map::new();
        for column in columns {
            if let Some(value) = self.0.get(column) {
                projected.insert(column.clone(), value.clone());
            }
        }
        Row(projected)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_id_accepts_numbers_and_strings() {
        let from_number: RowId = serde_json::from_value(json!(1234567)).unwrap();
        let from_string: RowId = serde_json::from_value(json!("1234567")).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_str(), "1234567");
    }

    #[test]
    fn row_id_rejects_blank_and_other_values() {
        assert!(serde_json::from_value::<RowId>(json!("   ")).is_err());
        assert!(serde_json::from_value::<RowId>(json!(null)).is_err());
        assert!(serde_json::from_value::<RowId>(json!({"ROWID": 1})).is_err());
    }

    #[test]
    fn row_id_falls_back_to_aliases() {
        let canonical = Row::new().with("ROWID", json!(7));
        let lowercase = Row::new().with("id", json!("8"));
        let snake = Row::new().with("ROW_ID", json!(9));
        let none = Row::new().with("Name", json!("Aspirin"));

        assert_eq!(canonical.row_id(), Some(RowId::from("7")));
        assert_eq!(lowercase.row_id(), Some(RowId::from("8")));
        assert_eq!(snake.row_id(), Some(RowId::from("9")));
        assert_eq!(none.row_id(), None);
    }

    #[test]
    fn canonical_row_id_wins_over_aliases() {
        let row = Row::new().with("id", json!(1)).with("ROWID", json!(2));
        assert_eq!(row.row_id(), Some(RowId::from("2")));
    }

    #[test]
    fn project_keeps_only_requested_columns() {
        let row = Row::new()
            .with("Name", json!("Aspirin"))
            .with("Quantity", json!(4))
            .with("Price", json!(12));
        let projected = row.project(&["Name".to_string(), "Missing".to_string()]);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get_str("Name"), Some("Aspirin"));
    }

    #[test]
    fn row_serializes_as_plain_object() {
        let row = Row::new().with("Name", json!("Aspirin"));
        assert_eq!(serde_json::to_value(&row).unwrap(), json!({"Name": "Aspirin"}));
    }
}
