//! The caller-facing entry point.

use crate::config::PluckConfig;
use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use crate::traits::Relation;

use super::include::PluckSpec;
use super::key::ColumnKey;
use super::node::Node;
use super::spec::AssociationResolver;

/// A deep pluck over a root relation.
///
/// Build the tree with [`add`](Pluck::add), then run it with
/// [`load_all`](Pluck::load_all). Loading consumes the tree.
///
/// ```rust
/// use deep_pluck_query::memory::MemoryStore;
/// use deep_pluck_query::relations::{AssociationSpec, EntitySpec, Pluck, PluckSpec, Schema};
/// use deep_pluck_query::{row, RowExt};
///
/// # futures::executor::block_on(async {
/// let schema = Schema::new()
///     .entity(EntitySpec::new("User", "users").association(AssociationSpec::has_many("posts", "Post")))
///     .entity(EntitySpec::new("Post", "posts"));
///
/// let store = MemoryStore::new();
/// store.insert("users", row! { "id" => 1, "name" => "alice" });
/// store.insert("posts", row! { "id" => 1, "user_id" => 1, "title" => "hello" });
///
/// let rows = Pluck::new(store.relation("User", "users"), &schema)
///     .add(PluckSpec::from("name").and(("posts", "title")))
///     .unwrap()
///     .load_all()
///     .await
///     .unwrap();
///
/// assert_eq!(rows[0].get("id"), None);
/// assert_eq!(rows[0].many("posts").unwrap()[0], row! { "title" => "hello" });
/// # });
/// ```
#[derive(Debug)]
pub struct Pluck<R: Relation, M: AssociationResolver> {
    root: Node<R>,
    resolver: M,
    config: PluckConfig,
}

impl<R: Relation, M: AssociationResolver> Pluck<R, M> {
    /// Start a pluck over `relation`, resolving associations with `resolver`.
    pub fn new(relation: R, resolver: M) -> Self {
        Self {
            root: Node::root(relation),
            resolver,
            config: PluckConfig::default(),
        }
    }

    /// Use a specific configuration.
    pub fn with_config(mut self, config: PluckConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PluckConfig {
        &self.config
    }

    /// Declare columns and associations.
    ///
    /// Fails immediately if an association name does not resolve.
    pub fn add(mut self, spec: impl Into<PluckSpec>) -> QueryResult<Self> {
        self.root.add(spec.into(), &self.resolver)?;
        Ok(self)
    }

    /// The root of the association tree.
    pub fn root(&self) -> &Node<R> {
        &self.root
    }

    /// The columns the root query will project.
    pub fn columns(&self) -> Vec<ColumnKey> {
        self.root.query_columns()
    }

    /// Load, merge and prune the whole tree.
    pub async fn load_all(self) -> QueryResult<Vec<Row>> {
        self.load_all_with(|relation| relation).await
    }

    /// Like [`load_all`](Pluck::load_all), transforming the root relation first.
    pub async fn load_all_with<F>(mut self, transform: F) -> QueryResult<Vec<Row>>
    where
        F: FnOnce(R) -> R + Send,
    {
        let mut rows = self.load_data_with(transform).await?;
        self.delete_extra_columns(&mut rows);
        Ok(rows)
    }

    /// Load and merge without pruning.
    ///
    /// The returned rows still carry every join key. Pass them to
    /// [`delete_extra_columns`](Pluck::delete_extra_columns) once done.
    pub async fn load_data(&mut self) -> QueryResult<Vec<Row>> {
        self.load_data_with(|relation| relation).await
    }

    async fn load_data_with<F>(&mut self, transform: F) -> QueryResult<Vec<Row>>
    where
        F: FnOnce(R) -> R + Send,
    {
        self.config.validate()?;
        let relation = transform(self.root.relation.clone());
        self.root.load_root(relation, &self.config).await
    }

    /// Strip join-only columns from rows produced by [`load_data`](Pluck::load_data).
    pub fn delete_extra_columns(&self, rows: &mut [Row]) {
        self.root.delete_extra_columns(rows);
    }

    /// Pluck the associations of records the caller already holds.
    ///
    /// No root query is issued. Each record is narrowed to the requested
    /// columns and the keys its associations need.
    pub async fn load_records(mut self, records: Vec<Row>) -> QueryResult<Vec<Row>> {
        self.config.validate()?;
        let mut rows = self.root.load_preloaded(records, &self.config).await?;
        self.delete_extra_columns(&mut rows);
        Ok(rows)
    }

    /// Pluck the associations of a single record.
    pub async fn load_record(self, record: Row) -> QueryResult<Row> {
        self.load_records(vec![record])
            .await?
            .pop()
            .ok_or_else(|| QueryError::internal("preloaded record was lost while loading"))
    }
}
