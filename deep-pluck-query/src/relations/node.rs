//! The association tree and its column planner.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{QueryError, QueryResult};
use crate::traits::Relation;

use super::include::PluckSpec;
use super::key::{ColumnKey, dedup_by_key};
use super::spec::{AssociationFacts, AssociationResolver};

/// One level of requested data.
///
/// A node owns its children. Each child carries the resolved facts of the
/// association that produced it, so planning and loading never need to look
/// back at the parent.
#[derive(Debug, Clone)]
pub struct Node<R: Relation> {
    pub(crate) relation: R,
    pub(crate) association: Option<AssociationFacts>,
    pub(crate) need_columns: Vec<ColumnKey>,
    pub(crate) children: IndexMap<String, Node<R>>,
    pub(crate) extra_columns: Vec<String>,
}

impl<R: Relation> Node<R> {
    /// A root node over `relation`.
    pub fn root(relation: R) -> Self {
        Self {
            relation,
            association: None,
            need_columns: Vec::new(),
            children: IndexMap::new(),
            extra_columns: Vec::new(),
        }
    }

    fn child(relation: R, facts: AssociationFacts) -> Self {
        Self {
            association: Some(facts),
            ..Self::root(relation)
        }
    }

    /// The relation this node projects from.
    pub fn relation(&self) -> &R {
        &self.relation
    }

    /// Facts of the association that produced this node; `None` for the root.
    pub fn association(&self) -> Option<&AssociationFacts> {
        self.association.as_ref()
    }

    /// Columns the caller asked for, as written.
    pub fn need_columns(&self) -> &[ColumnKey] {
        &self.need_columns
    }

    /// Child nodes by association name.
    pub fn children(&self) -> &IndexMap<String, Node<R>> {
        &self.children
    }

    /// A child node.
    pub fn get(&self, association: &str) -> Option<&Node<R>> {
        self.children.get(association)
    }

    /// Keys fetched only for joining, known once the node has been loaded.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Apply a spec to this node.
    ///
    /// Columns are added to the requested set. Associations create or reuse
    /// a child node and the nested spec is applied to it. Association names
    /// are resolved right away so a misspelling fails here, before any query.
    pub fn add<M>(&mut self, spec: PluckSpec, resolver: &M) -> QueryResult<()>
    where
        M: AssociationResolver + ?Sized,
    {
        match spec {
            PluckSpec::Empty => {}
            PluckSpec::Column(column) => {
                let column = ColumnKey::new(column);
                if column.key().is_empty() {
                    return Err(QueryError::invalid_select(format!(
                        "Column '{}' requested on {} has no name",
                        column.raw(),
                        self.relation.entity()
                    ))
                    .with_entity(self.relation.entity()));
                }
                self.need_columns.push(column);
            }
            PluckSpec::List(items) => {
                for item in items {
                    self.add(item, resolver)?;
                }
            }
            PluckSpec::Nested(map) => {
                for (name, nested) in map {
                    self.child_mut(name, resolver)?.add(nested, resolver)?;
                }
            }
        }
        Ok(())
    }

    fn child_mut<M>(&mut self, name: String, resolver: &M) -> QueryResult<&mut Node<R>>
    where
        M: AssociationResolver + ?Sized,
    {
        match self.children.entry(name) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let facts = resolver.resolve(self.relation.entity(), entry.key())?;
                let relation = self
                    .relation
                    .related(&facts.target_entity, &facts.target_table);
                Ok(entry.insert(Node::child(relation, facts)))
            }
        }
    }

    /// The columns to project for this node.
    ///
    /// In order: the key the parent matches this node's rows on, the keys each
    /// child needs from this node's rows, then the requested columns. Columns
    /// sharing a canonical key are fetched once, in the first form seen.
    pub fn query_columns(&self) -> Vec<ColumnKey> {
        let for_parent = self.association.as_ref().map(AssociationFacts::child_key);
        let for_children = self
            .children
            .values()
            .filter_map(|child| child.association.as_ref().map(AssociationFacts::parent_key));
        dedup_by_key(
            for_parent
                .into_iter()
                .chain(for_children)
                .chain(self.need_columns.iter().cloned()),
        )
    }

    /// Canonical keys among `columns` that the caller did not ask for.
    pub(crate) fn extra_keys(&self, columns: &[ColumnKey]) -> Vec<String> {
        columns
            .iter()
            .filter(|column| !self.need_columns.iter().any(|need| need.same_key(column)))
            .map(|column| column.key().to_string())
            .collect()
    }
}
