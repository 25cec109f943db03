//! Filter expressions used as association scopes.
//!
//! The loader treats a [`Filter`] as opaque: it is only ever handed to
//! [`Relation::apply_scope`](crate::traits::Relation::apply_scope). Stores
//! either evaluate it in process ([`Filter::matches`]) or render it to SQL
//! ([`Filter::to_sql`]).

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A filter expression over the columns of a relation.
///
/// Column names may be bare (`title`) or table-qualified (`posts.title`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(String, Value),
    /// Not equals comparison.
    NotEquals(String, Value),

    /// Less than comparison.
    Lt(String, Value),
    /// Less than or equal comparison.
    Lte(String, Value),
    /// Greater than comparison.
    Gt(String, Value),
    /// Greater than or equal comparison.
    Gte(String, Value),

    /// In a list of values.
    In(String, Vec<Value>),
    /// Not in a list of values.
    NotIn(String, Vec<Value>),

    /// Contains (LIKE %value%).
    Contains(String, String),
    /// Starts with (LIKE value%).
    StartsWith(String, String),
    /// Ends with (LIKE %value).
    EndsWith(String, String),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Equality on a column.
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals(column.into(), value.into())
    }

    /// Membership in a list of values.
    pub fn in_list(column: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Suffix match on a string column.
    pub fn ends_with(column: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::EndsWith(column.into(), suffix.into())
    }

    /// Prefix match on a string column.
    pub fn starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::StartsWith(column.into(), prefix.into())
    }

    /// Substring match on a string column.
    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains(column.into(), needle.into())
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::Or(filters),
        }
    }

    /// Negate a filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Evaluate the filter against a row.
    ///
    /// `lookup` resolves a (possibly qualified) column name to its value.
    /// Evaluation follows SQL's three-valued logic: a comparison with null is
    /// unknown, `NOT` of unknown stays unknown, and a row only matches when
    /// the whole expression is true. Values of different types never compare
    /// equal. Pattern matches ignore ASCII case, like SQLite's `LIKE`.
    pub fn matches<'a, F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        self.evaluate(lookup).unwrap_or(false)
    }

    /// Three-valued evaluation; `None` is SQL's UNKNOWN.
    fn evaluate<'a, F>(&self, lookup: &F) -> Option<bool>
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        let get = |col: &str| lookup(col).filter(|v| !v.is_null());

        match self {
            Self::None => Some(true),
            Self::Equals(col, val) if val.is_null() => Some(get(col).is_none()),
            Self::Equals(col, val) => get(col).map(|found| found == val),
            Self::NotEquals(col, val) if val.is_null() => Some(get(col).is_some()),
            Self::NotEquals(col, val) => get(col).map(|found| found != val),
            Self::Lt(col, val) => compare(get(col), val).map(|o| o.is_some_and(|o| o.is_lt())),
            Self::Lte(col, val) => compare(get(col), val).map(|o| o.is_some_and(|o| o.is_le())),
            Self::Gt(col, val) => compare(get(col), val).map(|o| o.is_some_and(|o| o.is_gt())),
            Self::Gte(col, val) => compare(get(col), val).map(|o| o.is_some_and(|o| o.is_ge())),
            Self::In(_, values) if values.is_empty() => Some(false),
            Self::In(col, values) => membership(get(col), values),
            Self::NotIn(_, values) if values.is_empty() => Some(true),
            Self::NotIn(col, values) => membership(get(col), values).map(|found| !found),
            Self::Contains(col, needle) => {
                text(get(col)).map(|s| fold(&s).contains(&fold(needle)))
            }
            Self::StartsWith(col, prefix) => {
                text(get(col)).map(|s| fold(&s).starts_with(&fold(prefix)))
            }
            Self::EndsWith(col, suffix) => {
                text(get(col)).map(|s| fold(&s).ends_with(&fold(suffix)))
            }
            Self::IsNull(col) => Some(get(col).is_none()),
            Self::IsNotNull(col) => Some(get(col).is_some()),
            Self::And(filters) => {
                let mut result = Some(true);
                for filter in filters {
                    match filter.evaluate(lookup) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Self::Or(filters) => {
                let mut result = Some(false);
                for filter in filters {
                    match filter.evaluate(lookup) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Self::Not(filter) => filter.evaluate(lookup).map(|b| !b),
        }
    }

    /// Render the filter as a SQL fragment with `?` placeholders.
    ///
    /// `column` renders a column name into a SQL identifier; bound values are
    /// appended to `params` in placeholder order.
    pub fn to_sql<F>(&self, column: &F, params: &mut Vec<Value>) -> String
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::None => "1 = 1".to_string(),

            Self::Equals(col, val) => {
                if val.is_null() {
                    format!("{} IS NULL", column(col))
                } else {
                    params.push(val.clone());
                    format!("{} = ?", column(col))
                }
            }
            Self::NotEquals(col, val) => {
                if val.is_null() {
                    format!("{} IS NOT NULL", column(col))
                } else {
                    params.push(val.clone());
                    format!("{} != ?", column(col))
                }
            }

            Self::Lt(col, val) => binary(column(col), "<", val, params),
            Self::Lte(col, val) => binary(column(col), "<=", val, params),
            Self::Gt(col, val) => binary(column(col), ">", val, params),
            Self::Gte(col, val) => binary(column(col), ">=", val, params),

            Self::In(col, values) => {
                if values.is_empty() {
                    return "1 = 0".to_string();
                }
                params.extend(values.iter().cloned());
                format!("{} IN ({})", column(col), placeholders(values.len()))
            }
            Self::NotIn(col, values) => {
                if values.is_empty() {
                    return "1 = 1".to_string();
                }
                params.extend(values.iter().cloned());
                format!("{} NOT IN ({})", column(col), placeholders(values.len()))
            }

            Self::Contains(col, needle) => {
                like(column(col), format!("%{}%", escape_like(needle)), params)
            }
            Self::StartsWith(col, prefix) => {
                like(column(col), format!("{}%", escape_like(prefix)), params)
            }
            Self::EndsWith(col, suffix) => {
                like(column(col), format!("%{}", escape_like(suffix)), params)
            }

            Self::IsNull(col) => format!("{} IS NULL", column(col)),
            Self::IsNotNull(col) => format!("{} IS NOT NULL", column(col)),

            Self::And(filters) => join(filters, " AND ", column, params),
            Self::Or(filters) => join(filters, " OR ", column, params),
            Self::Not(filter) => format!("NOT ({})", filter.to_sql(column, params)),
        }
    }
}

/// `None` when either side is null; `Some(None)` when the types do not order.
fn compare(found: Option<&Value>, expected: &Value) -> Option<Option<std::cmp::Ordering>> {
    let found = found?;
    if expected.is_null() {
        return None;
    }
    Some(match (found, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (a, b) => a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b)),
    })
}

/// `x IN (...)`: unknown when `x` is null, or when it is absent and the list holds a null.
fn membership(found: Option<&Value>, values: &[Value]) -> Option<bool> {
    let found = found?;
    if values.contains(found) {
        Some(true)
    } else if values.iter().any(Value::is_null) {
        None
    } else {
        Some(false)
    }
}

/// The text a pattern match sees. Integers match on their decimal form.
fn text(found: Option<&Value>) -> Option<String> {
    match found? {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => Some(String::new()),
    }
}

fn fold(s: &str) -> String {
    s.to_ascii_lowercase()
}

fn binary(column: String, op: &str, val: &Value, params: &mut Vec<Value>) -> String {
    params.push(val.clone());
    format!("{} {} ?", column, op)
}

fn like(column: String, pattern: String, params: &mut Vec<Value>) -> String {
    params.push(Value::String(pattern));
    format!("{} LIKE ? ESCAPE '\\'", column)
}

/// Escape `LIKE` wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn join<F>(filters: &[Filter], sep: &str, column: &F, params: &mut Vec<Value>) -> String
where
    F: Fn(&str) -> String,
{
    if filters.is_empty() {
        return "1 = 1".to_string();
    }
    let parts: Vec<_> = filters.iter().map(|f| f.to_sql(column, params)).collect();
    format!("({})", parts.join(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::row::Row;

    fn eval(filter: &Filter, row: &Row) -> bool {
        filter.matches(&|col: &str| row.get(col))
    }

    #[test]
    fn test_and_or_collapse() {
        assert!(Filter::and([]).is_none());
        assert_eq!(
            Filter::or([Filter::None, Filter::equals("a", 1)]),
            Filter::equals("a", 1)
        );
        assert!(Filter::not(Filter::None).is_none());
    }

    #[test]
    fn test_matches_scalar() {
        let row = row! { "title" => "post1", "score" => 7 };
        assert!(eval(&Filter::equals("title", "post1"), &row));
        assert!(eval(&Filter::ends_with("title", "1"), &row));
        assert!(eval(&Filter::Gt("score".into(), Value::Int(3)), &row));
        assert!(!eval(&Filter::equals("score", "7"), &row));
    }

    #[test]
    fn test_matches_null_semantics() {
        let row = row! { "deleted_at" => None::<String> };
        assert!(eval(&Filter::IsNull("deleted_at".into()), &row));
        assert!(eval(&Filter::IsNull("missing".into()), &row));
        assert!(!eval(&Filter::NotEquals("deleted_at".into(), Value::Int(1)), &row));
    }

    #[test]
    fn test_matches_logical() {
        let row = row! { "title" => "post3" };
        let scope = Filter::or([
            Filter::ends_with("title", "post1"),
            Filter::ends_with("title", "post3"),
        ]);
        assert!(eval(&scope, &row));
        assert!(!eval(&Filter::not(scope), &row));
    }

    #[test]
    fn test_to_sql() {
        let filter = Filter::and([
            Filter::in_list("user_id", [1, 2]),
            Filter::ends_with("title", "post1"),
            Filter::IsNotNull("name".into()),
        ]);
        let mut params = Vec::new();
        let sql = filter.to_sql(&|c: &str| format!("\"{}\"", c), &mut params);

        assert_eq!(
            sql,
            "(\"user_id\" IN (?, ?) AND \"title\" LIKE ? ESCAPE '\\' AND \"name\" IS NOT NULL)"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], Value::String("%post1".into()));
    }

    #[test]
    fn test_not_of_null_comparison_is_unknown() {
        let row = row! { "kind" => None::<String>, "title" => "post1" };
        let not_primary = Filter::not(Filter::equals("kind", "primary"));
        assert!(!eval(&not_primary, &row));
        assert!(!eval(&Filter::equals("kind", "primary"), &row));
        assert!(!eval(&Filter::not(Filter::Gt("kind".into(), Value::Int(1))), &row));

        // Unknown OR true is true; unknown AND false is false.
        assert!(eval(&Filter::or([not_primary.clone(), Filter::equals("title", "post1")]), &row));
        assert!(eval(
            &Filter::not(Filter::and([not_primary, Filter::equals("title", "post2")])),
            &row
        ));
    }

    #[test]
    fn test_in_list_with_null() {
        let row = row! { "id" => 3 };
        assert!(!eval(&Filter::NotIn("id".into(), vec![Value::Int(1), Value::Null]), &row));
        assert!(eval(&Filter::In("id".into(), vec![Value::Int(3), Value::Null]), &row));
        assert!(eval(&Filter::NotIn("id".into(), Vec::new()), &row));
    }

    #[test]
    fn test_pattern_ignores_ascii_case() {
        let row = row! { "title" => "post one" };
        assert!(eval(&Filter::ends_with("title", "ONE"), &row));
        assert!(eval(&Filter::starts_with("title", "Post"), &row));
        assert!(eval(&Filter::contains("title", "ST O"), &row));
        assert!(!eval(&Filter::contains("title", "post_one"), &row));
        assert!(!eval(&Filter::contains("title", "%"), &row));
    }

    #[test]
    fn test_like_escapes_wildcards() {
        let mut params = Vec::new();
        let sql = Filter::contains("title", "50%_off\\").to_sql(&|c: &str| c.to_string(), &mut params);
        assert_eq!(sql, "title LIKE ? ESCAPE '\\'");
        assert_eq!(params, vec![Value::String("%50\\%\\_off\\\\%".into())]);
    }

    #[test]
    fn test_empty_in_is_false() {
        let mut params = Vec::new();
        let sql = Filter::In("id".into(), Vec::new()).to_sql(&|c: &str| c.to_string(), &mut params);
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }
}
