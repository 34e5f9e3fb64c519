//! Value enum for dynamic cell values

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A dynamic value held by one cell of a [`Row`](super::Row).
///
/// The row source decides the types; the table only formats, compares and
/// searches them.
///
/// # Example
///
/// ```
/// use datatable_lib::model::Value;
///
/// let name = Value::from("Contoso");
/// let age = Value::from(42i64);
/// let empty = Value::Null;
/// assert_eq!(empty.to_string(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/empty value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
    /// Fallback for structured JSON values.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Json(_) => "json",
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Case-insensitive substring match against the displayed value.
    ///
    /// An empty term matches everything.
    pub fn contains_text(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        self.to_string().to_lowercase().contains(&term.to_lowercase())
    }

    /// Total ordering used for sorting rows.
    ///
    /// Nulls sort first, numbers compare numerically (integers and floats are
    /// mixed), everything else compares by its displayed text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from("R0C0").to_string(), "R0C0");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(true).to_string(), "true");
    }

    #[test]
    fn test_contains_text_is_case_insensitive() {
        let value = Value::from("R10C3");
        assert!(value.contains_text("c3"));
        assert!(value.contains_text("R1"));
        assert!(!value.contains_text("R2"));
        assert!(Value::Null.contains_text(""));
    }

    #[test]
    fn test_sort_cmp() {
        assert_eq!(Value::Null.sort_cmp(&Value::from(1i64)), Ordering::Less);
        assert_eq!(Value::from(2i64).sort_cmp(&Value::from(10i64)), Ordering::Less);
        assert_eq!(Value::from(2.5).sort_cmp(&Value::from(2i64)), Ordering::Greater);
        // Strings compare lexicographically: "R14C0" < "R1C0"
        assert_eq!(
            Value::from("R14C0").sort_cmp(&Value::from("R1C0")),
            Ordering::Less
        );
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 1.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(3),
                Value::Float(1.5),
                Value::String("x".into())
            ]
        );
    }
}
