//! Dynamic table row

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// One row as delivered by the row source.
///
/// Rows hold cell values as a `HashMap<String, Value>` keyed by column name.
/// The row's absolute position is not stored on the row; it is the key under
/// which the [`RangeCache`](crate::cache::RangeCache) holds it.
///
/// # Example
///
/// ```
/// use datatable_lib::model::Row;
///
/// let row = Row::new()
///     .set("id", 7i64)
///     .set("name", "Contoso");
///
/// assert_eq!(row.get_string("name").unwrap(), Some("Contoso"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<String, Value>,
}

impl Row {
    /// Creates a new empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value, returning the row for chaining.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a field value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field value, treating a missing field as null.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Returns `true` if the row contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Gets a string field.
    ///
    /// Returns `Ok(None)` if the field is missing or null.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(FieldError::type_mismatch(field, "string", other.type_name())),
        }
    }

    /// Gets an integer field.
    ///
    /// Returns `Ok(None)` if the field is missing or null.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Gets a boolean field.
    ///
    /// Returns `Ok(None)` if the field is missing or null.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Returns the first of `columns` whose value contains `term`
    /// (case-insensitive).
    pub fn matches<'a>(&self, columns: &'a [String], term: &str) -> Option<&'a str> {
        columns
            .iter()
            .find(|column| self.value(column).contains_text(term))
            .map(String::as_str)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let row = Row::new().set("id", 3i64).set("name", "Item 3").set("flag", true);

        assert_eq!(row.get_i64("id").unwrap(), Some(3));
        assert_eq!(row.get_string("name").unwrap(), Some("Item 3"));
        assert_eq!(row.get_bool("flag").unwrap(), Some(true));
        assert_eq!(row.get_string("missing").unwrap(), None);
        assert!(row.get_string("id").is_err());
    }

    #[test]
    fn test_matches_returns_first_matching_column() {
        let row = Row::new().set("col0", "R4C0").set("col1", "R4C1");
        let columns = vec!["col0".to_string(), "col1".to_string()];

        assert_eq!(row.matches(&columns, "c1"), Some("col1"));
        assert_eq!(row.matches(&columns, "R4"), Some("col0"));
        assert_eq!(row.matches(&columns, "R5"), None);
    }

    #[test]
    fn test_matched_column_outlives_row() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let matched = {
            let row = Row::new().set("id", 7i64).set("name", "Seven");
            row.matches(&columns, "sev")
        };
        assert_eq!(matched, Some("name"));
    }

    #[test]
    fn test_transparent_serde() {
        let row: Row = serde_json::from_str(r#"{"id": 1, "name": "a"}"#).unwrap();
        assert_eq!(row.value("id"), &Value::Int(1));
        assert_eq!(row.value("other"), &Value::Null);
    }
}
