//! Plucked rows.
//!
//! A [`Row`] maps canonical column keys to [`Value`]s. Rows are mutated in
//! place while loading: associations are written in under their own name and
//! join-only columns are removed once the whole tree has been merged.

use indexmap::IndexMap;

use crate::value::{KeyValue, Value};

/// A flat (or, after merging, nested) result row.
pub type Row = IndexMap<String, Value>;

/// Convenience accessors for [`Row`].
pub trait RowExt {
    /// The join identity stored under `column`, if any.
    fn key_of(&self, column: &str) -> Option<KeyValue>;

    /// A nested singular association.
    fn one(&self, association: &str) -> Option<&Row>;

    /// A nested collection association.
    fn many(&self, association: &str) -> Option<&[Row]>;
}

impl RowExt for Row {
    fn key_of(&self, column: &str) -> Option<KeyValue> {
        self.get(column).and_then(Value::as_key)
    }

    fn one(&self, association: &str) -> Option<&Row> {
        self.get(association).and_then(Value::as_row)
    }

    fn many(&self, association: &str) -> Option<&[Row]> {
        self.get(association).and_then(Value::as_rows)
    }
}

/// Build a [`Row`] from `column => value` pairs.
///
/// ```rust
/// use deep_pluck_query::{row, Value};
///
/// let row = row! { "id" => 1, "name" => "alice" };
/// assert_eq!(row["id"], Value::Int(1));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::row::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::row::Row::new();
        $(
            row.insert(::std::string::String::from($column), $crate::value::Value::from($value));
        )+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_macro() {
        let row = row! { "id" => 1, "name" => "alice", "email" => None::<String> };
        assert_eq!(row.len(), 3);
        assert_eq!(row["email"], Value::Null);
    }

    #[test]
    fn test_key_of() {
        let row = row! { "id" => 3, "parent_id" => None::<i64> };
        assert_eq!(row.key_of("id"), Some(KeyValue::Int(3)));
        assert_eq!(row.key_of("parent_id"), None);
        assert_eq!(row.key_of("missing"), None);
    }

    #[test]
    fn test_nested_accessors() {
        let mut row = row! { "id" => 1 };
        row.insert("contact".into(), Value::Row(row! { "address" => "x" }));
        row.insert("posts".into(), Value::Rows(vec![row! { "title" => "a" }]));

        assert!(row.one("contact").is_some());
        assert_eq!(row.many("posts").map(<[Row]>::len), Some(1));
        assert!(row.one("posts").is_none());
    }
}
