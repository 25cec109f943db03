//! Batched loading: one projection per node, keyed on the parent's values.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexSet;
use tracing::debug;

use crate::config::PluckConfig;
use crate::error::{QueryError, QueryResult};
use crate::row::{Row, RowExt};
use crate::traits::Relation;
use crate::value::{KeyValue, Value};
use crate::{pluck_debug, pluck_trace};

use super::combine::combine_data;
use super::node::Node;
use super::spec::AssociationFacts;

impl<R: Relation> Node<R> {
    /// Load this node as the root of a tree from `relation`.
    ///
    /// Rows come back merged but unpruned; join keys are still present so
    /// callers can inspect them before calling
    /// [`delete_extra_columns`](Node::delete_extra_columns).
    pub async fn load_root(&mut self, relation: R, config: &PluckConfig) -> QueryResult<Vec<Row>> {
        let columns = self.query_columns();
        self.extra_columns = self.extra_keys(&columns);
        let rows = relation.project(&columns).await?;
        debug!(entity = relation.entity(), rows = rows.len(), "loaded root rows");
        self.load_children(rows, config).await
    }

    /// Treat `rows` as this root's result and load the associations for them.
    ///
    /// Each row is narrowed to the planned columns first; columns it lacks
    /// are read as null.
    pub async fn load_preloaded(
        &mut self,
        rows: Vec<Row>,
        config: &PluckConfig,
    ) -> QueryResult<Vec<Row>> {
        let columns = self.query_columns();
        self.extra_columns = self.extra_keys(&columns);
        let rows = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = row.get(column.key()).cloned().unwrap_or(Value::Null);
                        (column.key().to_string(), value)
                    })
                    .collect::<Row>()
            })
            .collect();
        self.load_children(rows, config).await
    }

    /// Load this child node for the given parent rows.
    fn load_for<'a>(
        &'a mut self,
        parents: &'a [Row],
        config: &'a PluckConfig,
    ) -> BoxFuture<'a, QueryResult<Vec<Row>>> {
        Box::pin(async move {
            let facts = self
                .association
                .clone()
                .ok_or_else(|| QueryError::internal("child node has no association"))?;
            let columns = self.query_columns();
            self.extra_columns = self.extra_keys(&columns);

            let ids = collect_keys(parents, facts.parent_key().key());
            if ids.is_empty() {
                pluck_trace!(association = %facts.name, "no parent keys, skipping query");
                return Ok(Vec::new());
            }

            let base = self.scoped_relation(&facts);
            let child_key = facts.child_key();
            let chunk_size = config.batch_size.unwrap_or(ids.len()).max(1);
            let mut rows = Vec::new();
            for chunk in ids.chunks(chunk_size) {
                pluck_debug!(
                    association = %facts.name,
                    keys = chunk.len(),
                    columns = columns.len(),
                    "projecting association chunk"
                );
                let batch = base
                    .clone()
                    .filter_in(&child_key, chunk.to_vec())
                    .project(&columns)
                    .await?;
                rows.extend(batch);
            }
            debug!(
                association = %facts.name,
                keys = ids.len(),
                rows = rows.len(),
                "loaded association"
            );

            self.load_children(rows, config).await
        })
    }

    /// The child relation before the key filter: scope, discriminator, join.
    fn scoped_relation(&self, facts: &AssociationFacts) -> R {
        let mut relation = self.relation.clone();
        if let Some(scope) = &facts.scope {
            relation = relation.apply_scope(scope);
        }
        if let Some((column, value)) = facts.discriminator() {
            relation = relation.filter_eq(&column, Value::from(value));
        }
        if let Some(join) = facts.join_table() {
            relation = relation.join_through(join);
        }
        relation
    }

    /// Load every child association for `rows` and merge them in.
    ///
    /// Siblings only read the parent rows, so up to `sibling_concurrency` of
    /// them run at once. Merging happens afterwards, one association at a time.
    async fn load_children(&mut self, mut rows: Vec<Row>, config: &PluckConfig) -> QueryResult<Vec<Row>> {
        if rows.is_empty() || self.children.is_empty() {
            return Ok(rows);
        }

        let loaded: Vec<Vec<Row>> = {
            let parents = rows.as_slice();
            let pending: Vec<BoxFuture<'_, QueryResult<Vec<Row>>>> = self
                .children
                .values_mut()
                .map(|child| child.load_for(parents, config))
                .collect();
            stream::iter(pending)
                .buffered(config.sibling_concurrency.max(1))
                .try_collect()
                .await?
        };

        for (child, children) in self.children.values().zip(loaded) {
            if let Some(facts) = &child.association {
                combine_data(&mut rows, children, facts, config.on_multiple_matches)?;
            }
        }
        Ok(rows)
    }
}

/// Distinct, non-null values of `key` across `rows`, in first-seen order.
pub(crate) fn collect_keys(rows: &[Row], key: &str) -> Vec<Value> {
    rows.iter()
        .filter_map(|row| row.key_of(key))
        .collect::<IndexSet<KeyValue>>()
        .iter()
        .map(KeyValue::to_value)
        .collect()
}
