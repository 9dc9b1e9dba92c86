//! Scalar view over query result fields

/// A field value resolved from a result record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing field, null field, or a path that could not be followed
    Null,
    /// Text (ids, names, timestamps as sent by the API)
    String(String),
    /// Whole number
    Int(i64),
    /// Floating point (currency, percent, double)
    Float(f64),
    /// Checkbox
    Bool(bool),
    /// Nested relationship record (e.g. `Parent__r`)
    Record,
}

impl Value {
    /// Render a scalar as the key stored in catalog sets and indices.
    ///
    /// Null, empty strings and nested records have no key.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Null | Value::Record => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
        }
    }

    /// Parse from JSON value
    ///
    /// Strings stay strings: ids and timestamps must round-trip byte for byte
    /// into catalog sets and IN-lists.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Object(_) => Value::Record,
            // Multi-valued fields are not addressable by path
            serde_json::Value::Array(_) => Value::Null,
        }
    }
}
