//! SQL-backed relations.

use async_trait::async_trait;
use tracing::trace;

use deep_pluck_query::error::{QueryError, QueryResult};
use deep_pluck_query::relations::{ColumnKey, JoinTable};
use deep_pluck_query::{Filter, Relation, Row, Value};

use crate::connection::SqliteConnection;

/// A relation over one SQLite table, rendered to a single `SELECT`.
#[derive(Debug, Clone)]
pub struct SqliteRelation {
    conn: SqliteConnection,
    entity: String,
    table: String,
    filters: Vec<Filter>,
    joins: Vec<JoinTable>,
}

impl SqliteRelation {
    /// Create a relation over every row of `table`.
    pub fn new(conn: SqliteConnection, entity: &str, table: &str) -> Self {
        Self {
            conn,
            entity: entity.to_string(),
            table: table.to_string(),
            filters: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Render the `SELECT` for a projection along with its bound parameters.
    ///
    /// Every column is aliased to its canonical key so that qualified and
    /// bare references come back under the same name.
    pub fn to_sql(&self, columns: &[ColumnKey]) -> (String, Vec<Value>) {
        let select = columns
            .iter()
            .map(|column| format!("{} AS {}", self.column_sql(column), quote(column.key())))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {} FROM {}", select, quote(&self.table));
        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} ON {}.{} = {}.{}",
                quote(&join.table),
                quote(&join.table),
                quote(&join.target_column),
                quote(&self.table),
                quote(&join.target_key),
            ));
        }

        let mut params = Vec::new();
        let filter = Filter::and(self.filters.iter().cloned());
        if !filter.is_none() {
            let render = |column: &str| self.column_sql(&ColumnKey::new(column));
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql(&render, &mut params));
        }

        (sql, params)
    }

    fn column_sql(&self, column: &ColumnKey) -> String {
        let table = column.table().unwrap_or(&self.table);
        format!("{}.{}", quote(table), quote(column.key()))
    }
}

/// Quote an identifier, doubling embedded quotes.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl Relation for SqliteRelation {
    fn entity(&self) -> &str {
        &self.entity
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn related(&self, entity: &str, table: &str) -> Self {
        Self::new(self.conn.clone(), entity, table)
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
        let (sql, params) = self.to_sql(columns);
        trace!(table = %self.table, sql = %sql, "sqlite projection");

        self.conn.query_params(&sql, params).await.map_err(|e| {
            QueryError::from(e)
                .with_entity(&self.entity)
                .with_sql(sql.clone())
        })
    }
}
