//! An in-process relation store.
//!
//! [`MemoryStore`] keeps tables of rows behind `parking_lot` locks and hands
//! out [`MemoryRelation`]s that evaluate filters, scopes and join tables in
//! process. Every projection is recorded in a query log, which makes it easy
//! to check how many queries a load issued.
//!
//! ```rust
//! use deep_pluck_query::memory::MemoryStore;
//! use deep_pluck_query::relations::ColumnKey;
//! use deep_pluck_query::{row, Relation, Value};
//!
//! # futures::executor::block_on(async {
//! let store = MemoryStore::new();
//! store.insert("users", row! { "id" => 1, "name" => "alice" });
//! store.insert("users", row! { "id" => 2, "name" => "bob" });
//!
//! let rows = store
//!     .relation("User", "users")
//!     .filter_in(&ColumnKey::new("users.id"), vec![Value::Int(2)])
//!     .project(&[ColumnKey::new("name")])
//!     .await
//!     .unwrap();
//!
//! assert_eq!(rows, vec![row! { "name" => "bob" }]);
//! assert_eq!(store.query_count(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::relations::{ColumnKey, JoinTable};
use crate::row::{Row, RowExt};
use crate::traits::Relation;
use crate::value::Value;

/// One projection executed against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    /// Table the relation ranges over.
    pub table: String,
    /// Projected columns, as written.
    pub columns: Vec<String>,
    /// Number of values across all `IN` filters, if any were applied.
    pub key_count: Option<usize>,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    failures: RwLock<HashMap<String, String>>,
    log: Mutex<Vec<ExecutedQuery>>,
}

/// Shared in-memory tables.
///
/// Cloning is cheap; clones share the same tables and query log.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to a table, creating the table if needed.
    pub fn insert(&self, table: &str, row: Row) {
        self.inner
            .tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Append several rows to a table.
    pub fn insert_many(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.inner
            .tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Number of rows in a table.
    pub fn len(&self, table: &str) -> usize {
        self.inner.tables.read().get(table).map_or(0, Vec::len)
    }

    /// Whether a table has no rows.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// A relation over every row of `table`.
    pub fn relation(&self, entity: &str, table: &str) -> MemoryRelation {
        MemoryRelation {
            store: self.clone(),
            entity: entity.to_string(),
            table: table.to_string(),
            filters: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Make every projection touching `table` fail with `message`.
    pub fn fail_table(&self, table: &str, message: impl Into<String>) {
        self.inner
            .failures
            .write()
            .insert(table.to_string(), message.into());
    }

    /// All projections executed so far.
    pub fn queries(&self) -> Vec<ExecutedQuery> {
        self.inner.log.lock().clone()
    }

    /// Number of projections executed so far.
    pub fn query_count(&self) -> usize {
        self.inner.log.lock().len()
    }

    /// Forget all recorded projections.
    pub fn clear_log(&self) {
        self.inner.log.lock().clear();
    }
}

/// A lazily evaluated relation over a [`MemoryStore`] table.
#[derive(Debug, Clone)]
pub struct MemoryRelation {
    store: MemoryStore,
    entity: String,
    table: String,
    filters: Vec<Filter>,
    joins: Vec<JoinTable>,
}

impl MemoryRelation {
    /// Filters applied so far.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Join tables applied so far.
    pub fn joins(&self) -> &[JoinTable] {
        &self.joins
    }

    fn execute(&self, columns: &[ColumnKey]) -> QueryResult<Vec<Row>> {
        let key_count = self
            .filters
            .iter()
            .filter_map(|f| match f {
                Filter::In(_, values) => Some(values.len()),
                _ => None,
            })
            .reduce(|a, b| a + b);
        self.store.inner.log.lock().push(ExecutedQuery {
            table: self.table.clone(),
            columns: columns.iter().map(|c| c.raw().to_string()).collect(),
            key_count,
        });

        {
            let failures = self.store.inner.failures.read();
            let touched = std::iter::once(&self.table).chain(self.joins.iter().map(|j| &j.table));
            for table in touched {
                if let Some(message) = failures.get(table) {
                    return Err(QueryError::database(message.clone()).with_entity(&self.entity));
                }
            }
        }

        let tables = self.store.inner.tables.read();
        let empty = Vec::new();
        let base = tables.get(&self.table).unwrap_or(&empty);

        let mut joined: Vec<Vec<(&str, &Row)>> =
            base.iter().map(|row| vec![(self.table.as_str(), row)]).collect();
        for join in &self.joins {
            let links = tables.get(&join.table).unwrap_or(&empty);
            joined = joined
                .into_iter()
                .flat_map(|sources| {
                    let target = sources[0].1.key_of(&join.target_key);
                    links
                        .iter()
                        .filter(|link| target.is_some() && link.key_of(&join.target_column) == target)
                        .map(|link| {
                            let mut combined = sources.clone();
                            combined.push((join.table.as_str(), link));
                            combined
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
        }

        let rows: Vec<Row> = joined
            .iter()
            .filter(|sources| {
                let get = |column: &str| lookup(sources, &self.table, column);
                self.filters.iter().all(|f| f.matches(&get))
            })
            .map(|sources| {
                columns
                    .iter()
                    .map(|column| {
                        let value = lookup(sources, &self.table, column.raw())
                            .cloned()
                            .unwrap_or(Value::Null);
                        (column.key().to_string(), value)
                    })
                    .collect()
            })
            .collect();

        trace!(table = %self.table, rows = rows.len(), "memory projection");
        Ok(rows)
    }
}

/// Resolve a possibly qualified column against the joined sources of a row.
///
/// Bare columns belong to the relation's own table.
fn lookup<'a>(sources: &[(&str, &'a Row)], own_table: &str, column: &str) -> Option<&'a Value> {
    let column = ColumnKey::new(column);
    let table = column.table().unwrap_or(own_table);
    sources
        .iter()
        .find(|(name, _)| *name == table)
        .and_then(|(_, row)| row.get(column.key()))
}

#[async_trait]
impl Relation for MemoryRelation {
    fn entity(&self) -> &str {
        &self.entity
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn related(&self, entity: &str, table: &str) -> Self {
        self.store.relation(entity, table)
    }

    fn filter_in(mut self, column: &ColumnKey, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column.raw().to_string(), values));
        self
    }

    fn filter_eq(mut self, column: &ColumnKey, value: Value) -> Self {
        self.filters.push(Filter::Equals(column.raw().to_string(), value));
        self
    }

    fn apply_scope(mut self, scope: &Filter) -> Self {
        self.filters.push(scope.clone());
        self
    }

    fn join_through(mut self, join: &JoinTable) -> Self {
        self.joins.push(join.clone());
        self
    }

    async fn project(&self, columns: &[ColumnKey]) -> QueryResult<Vec<Row>> {
        self.execute(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use pretty_assertions::assert_eq;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_many(
            "users",
            [row! { "id" => 1, "name" => "alice" }, row! { "id" => 2, "name" => "bob" }],
        );
        store.insert_many(
            "achievements",
            [row! { "id" => 1, "name" => "first" }, row! { "id" => 2, "name" => "second" }],
        );
        store.insert_many(
            "user_achievements",
            [
                row! { "user_id" => 1, "achievement_id" => 1 },
                row! { "user_id" => 1, "achievement_id" => 2 },
                row! { "user_id" => 2, "achievement_id" => 2 },
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_project_and_filter() {
        let store = store();
        let rows = store
            .relation("User", "users")
            .apply_scope(&Filter::equals("name", "alice"))
            .project(&[ColumnKey::new("users.id"), ColumnKey::new("name")])
            .await
            .unwrap();
        assert_eq!(rows, vec![row! { "id" => 1, "name" => "alice" }]);
    }

    #[tokio::test]
    async fn test_missing_columns_are_null() {
        let store = store();
        let rows = store
            .relation("User", "users")
            .project(&[ColumnKey::new("email")])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["email"], Value::Null);
    }

    #[tokio::test]
    async fn test_join_through() {
        let store = store();
        let join = JoinTable::new("user_achievements", "user_id", "achievement_id", "id");
        let rows = store
            .relation("Achievement", "achievements")
            .join_through(&join)
            .filter_in(&join.source(), vec![Value::Int(1)])
            .project(&[ColumnKey::new("user_achievements.user_id"), ColumnKey::new("name")])
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![
                row! { "user_id" => 1, "name" => "first" },
                row! { "user_id" => 1, "name" => "second" },
            ]
        );
    }

    #[tokio::test]
    async fn test_query_log() {
        let store = store();
        let users = store.relation("User", "users");
        users
            .clone()
            .filter_in(&ColumnKey::new("id"), vec![Value::Int(1), Value::Int(2)])
            .project(&[ColumnKey::new("id")])
            .await
            .unwrap();
        users.project(&[ColumnKey::new("name")]).await.unwrap();

        let queries = store.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].key_count, Some(2));
        assert_eq!(queries[1].key_count, None);
        assert_eq!(queries[1].columns, vec!["name".to_string()]);

        store.clear_log();
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_table() {
        let store = store();
        store.fail_table("users", "no such column: users.nope");
        let err = store
            .relation("User", "users")
            .project(&[ColumnKey::new("id")])
            .await
            .unwrap_err();
        assert!(err.is_database_error());
        assert_eq!(store.query_count(), 1);
    }
}
