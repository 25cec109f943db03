//! Pluck specifications: which columns and associations to load.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A declarative request for columns and nested associations.
///
/// Specs nest the same way the output does: a column name, a list of specs,
/// or a map from association name to the spec applied to that association.
///
/// ```rust
/// use deep_pluck_query::relations::PluckSpec;
///
/// // :name, posts: [:title, { comments: :body }]
/// let spec = PluckSpec::from("name").and(PluckSpec::nested(
///     "posts",
///     PluckSpec::from("title").and(PluckSpec::nested("comments", "body")),
/// ));
/// assert_eq!(spec.columns().collect::<Vec<_>>(), vec!["name"]);
///
/// let json: PluckSpec = serde_json::json!(["name", {"posts": ["title", {"comments": "body"}]}]).into();
/// assert_eq!(json, spec);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluckSpec {
    /// A single column.
    Column(String),
    /// Several specs applied to the same level.
    List(Vec<PluckSpec>),
    /// Associations and what to load from each.
    Nested(IndexMap<String, PluckSpec>),
    /// Nothing.
    #[default]
    Empty,
}

impl PluckSpec {
    /// A spec for one association.
    pub fn nested(association: impl Into<String>, spec: impl Into<PluckSpec>) -> Self {
        let mut map = IndexMap::new();
        map.insert(association.into(), spec.into());
        Self::Nested(map)
    }

    /// Combine two specs at the same level.
    pub fn and(self, other: impl Into<PluckSpec>) -> Self {
        let other = other.into();
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (Self::List(mut items), Self::List(more)) => {
                items.extend(more);
                Self::List(items)
            }
            (Self::List(mut items), other) => {
                items.push(other);
                Self::List(items)
            }
            (this, other) => Self::List(vec![this, other]),
        }
    }

    /// Whether the spec requests nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::List(items) => items.iter().all(Self::is_empty),
            Self::Nested(_) | Self::Column(_) => false,
        }
    }

    /// Columns requested at this level, in declaration order.
    pub fn columns(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Column(name) => Box::new(std::iter::once(name.as_str())),
            Self::List(items) => Box::new(items.iter().flat_map(|item| item.columns())),
            Self::Nested(_) | Self::Empty => Box::new(std::iter::empty()),
        }
    }
}

impl From<&str> for PluckSpec {
    fn from(column: &str) -> Self {
        Self::Column(column.to_string())
    }
}

impl From<String> for PluckSpec {
    fn from(column: String) -> Self {
        Self::Column(column)
    }
}

impl<T: Into<PluckSpec>> From<Vec<T>> for PluckSpec {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PluckSpec>, const N: usize> From<[T; N]> for PluckSpec {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<PluckSpec>> From<(K, V)> for PluckSpec {
    fn from((association, spec): (K, V)) -> Self {
        Self::nested(association, spec)
    }
}

impl From<IndexMap<String, PluckSpec>> for PluckSpec {
    fn from(map: IndexMap<String, PluckSpec>) -> Self {
        Self::Nested(map)
    }
}

impl<T: Into<PluckSpec>> From<Option<T>> for PluckSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map(Into::into).unwrap_or_default()
    }
}

impl From<serde_json::Value> for PluckSpec {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Empty,
            serde_json::Value::String(s) => Self::Column(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Nested(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            other => Self::Column(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_str_and_arrays() {
        assert_eq!(PluckSpec::from("id"), PluckSpec::Column("id".into()));
        assert_eq!(
            PluckSpec::from(["id", "name"]),
            PluckSpec::List(vec!["id".into(), "name".into()])
        );
    }

    #[test]
    fn test_pair_is_nested() {
        let spec: PluckSpec = ("posts", ["title"]).into();
        match spec {
            PluckSpec::Nested(map) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map["posts"], PluckSpec::from(["title"]));
            }
            other => panic!("expected nested, got {:?}", other),
        }
    }

    #[test]
    fn test_and_flattens() {
        let spec = PluckSpec::from("a").and("b").and(PluckSpec::Empty).and("c");
        assert_eq!(spec, PluckSpec::from(["a", "b", "c"]));
        assert_eq!(PluckSpec::Empty.and("x"), PluckSpec::from("x"));
    }

    #[test]
    fn test_is_empty() {
        assert!(PluckSpec::Empty.is_empty());
        assert!(PluckSpec::List(vec![PluckSpec::Empty]).is_empty());
        assert!(!PluckSpec::from("id").is_empty());
        assert!(PluckSpec::from(None::<&str>).is_empty());
    }

    #[test]
    fn test_columns_skip_nested() {
        let spec = PluckSpec::from("id").and(("posts", "title")).and("name");
        assert_eq!(spec.columns().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_from_json() {
        let spec: PluckSpec = json!({"contact": null, "posts": "title"}).into();
        match spec {
            PluckSpec::Nested(map) => {
                assert_eq!(map["contact"], PluckSpec::Empty);
                assert_eq!(map["posts"], PluckSpec::from("title"));
            }
            other => panic!("expected nested, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize() {
        let spec: PluckSpec = serde_json::from_str(r#"["name", {"posts": ["title"]}]"#).unwrap();
        assert_eq!(
            spec,
            PluckSpec::from("name").and(PluckSpec::nested("posts", ["title"]))
        );
    }
}
