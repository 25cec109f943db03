//! Scalar and nested values carried by plucked rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::row::Row;

/// A value stored under a column (or association) name in a [`Row`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// A collection association.
    Rows(Vec<Row>),
    /// A singular association.
    Row(Row),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The join identity of this value, if it has one.
    ///
    /// Nulls and nested rows never take part in key matching.
    pub fn as_key(&self) -> Option<KeyValue> {
        match self {
            Self::Bool(b) => Some(KeyValue::Bool(*b)),
            Self::Int(i) => Some(KeyValue::Int(*i)),
            Self::Float(f) => Some(KeyValue::Float(f.to_bits())),
            Self::String(s) => Some(KeyValue::String(s.clone())),
            Self::Null | Self::Rows(_) | Self::Row(_) => None,
        }
    }

    /// Borrow the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the numeric payload as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow a singular association.
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Borrow a collection association.
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Row> for Value {
    fn from(v: Row) -> Self {
        Self::Row(v)
    }
}

impl From<Vec<Row>> for Value {
    fn from(v: Vec<Row>) -> Self {
        Self::Rows(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Conversion from JSON.
///
/// Arrays must hold objects, since the only list a row carries is a
/// collection association. Integers must fit in an `i64`.
impl TryFrom<serde_json::Value> for Value {
    type Error = QueryError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Int(i),
                _ if n.is_u64() => {
                    return Err(QueryError::invalid_data_type(format!(
                        "JSON integer {} does not fit in an i64",
                        n
                    )));
                }
                (None, Some(f)) => Self::Float(f),
                (None, None) => {
                    return Err(QueryError::invalid_data_type(format!(
                        "Unsupported JSON number {}",
                        n
                    )));
                }
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Rows(
                items
                    .into_iter()
                    .map(|item| match Value::try_from(item)? {
                        Value::Row(row) => Ok(row),
                        other => Err(QueryError::invalid_data_type(format!(
                            "JSON arrays must hold objects, found {}",
                            other
                        ))),
                    })
                    .collect::<QueryResult<_>>()?,
            ),
            serde_json::Value::Object(map) => Self::Row(
                map.into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<QueryResult<_>>()?,
            ),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Rows(rows) => write!(f, "[{} rows]", rows.len()),
            Self::Row(_) => write!(f, "{{row}}"),
        }
    }
}

/// Hashable identity of a scalar join key.
///
/// Equality is exact and type-strict: `Int(1)` and `String("1")` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Int(i64),
    /// Float key, compared by bit pattern.
    Float(u64),
    /// String key.
    String(String),
}

impl KeyValue {
    /// Convert back into a filterable value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
