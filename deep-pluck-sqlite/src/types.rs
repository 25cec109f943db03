//! Conversions between plucked values and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};

use deep_pluck_query::Value;

use crate::error::{SqliteError, SqliteResult};

/// Convert a value into a bindable SQLite parameter.
///
/// Booleans bind as integers. Nested rows have no SQLite representation.
pub fn to_sqlite(value: &Value) -> SqliteResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Int(i) => Ok(SqlValue::Integer(*i)),
        Value::Float(f) => Ok(SqlValue::Real(*f)),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Row(_) | Value::Rows(_) => Err(SqliteError::type_conversion(
            "nested rows cannot be bound as SQLite parameters",
        )),
    }
}

/// Convert several values into SQLite parameters.
pub fn to_sqlite_params(values: &[Value]) -> SqliteResult<Vec<SqlValue>> {
    values.iter().map(to_sqlite).collect()
}

/// Convert a column value read from SQLite.
///
/// Blobs are read as (lossy) UTF-8 text.
pub fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
