//! Core traits for the data sources the loader pulls rows from.

use async_trait::async_trait;

use crate::error::QueryResult;
use crate::filter::Filter;
use crate::relations::{ColumnKey, JoinTable};
use crate::row::Row;
use crate::value::Value;

/// A filterable, projectable set of rows of a single entity.
///
/// Builder methods consume and return the relation so drivers can
/// accumulate predicates and joins. Nothing is executed until
/// [`project`](Relation::project) is awaited.
///
/// Projected rows must be keyed by the canonical key of each requested
/// column ([`ColumnKey::key`]), so `posts.user_id` comes back as `user_id`.
#[async_trait]
pub trait Relation: Clone + Send + Sync + Sized {
    /// Name of the entity this relation ranges over.
    fn entity(&self) -> &str;

    /// Table backing the entity.
    fn table(&self) -> &str;

    /// A fresh, unfiltered relation over another entity of the same store.
    fn related(&self, entity: &str, table: &str) -> Self;

    /// Keep rows whose `column` is one of `values`.
    fn filter_in(self, column: &ColumnKey, values: Vec<Value>) -> Self;

    /// Keep rows whose `column` equals `value`.
    fn filter_eq(self, column: &ColumnKey, value: Value) -> Self;

    /// Restrict the relation by an association scope.
    fn apply_scope(self, scope: &Filter) -> Self;

    /// Inner join a link table so its columns can be filtered and projected.
    fn join_through(self, join: &JoinTable) -> Self;

    /// Execute the relation, returning only the given columns.
    async fn project(&self, columns: &[ColumnKey]) -> QueryResult<Vec<Row>>;
}
