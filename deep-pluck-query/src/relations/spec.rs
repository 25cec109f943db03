//! Resolved association metadata.

use crate::error::QueryResult;
use crate::filter::Filter;

use super::key::ColumnKey;

/// Whether an association yields at most one row or any number of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one related row (`belongs_to`, `has_one`).
    One,
    /// Any number of related rows (`has_many`, many-to-many).
    Many,
}

impl Cardinality {
    /// Check if this association returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }

    /// Check if this association returns a single record.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::One)
    }
}

/// Which side of an association physically stores the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The parent row holds the foreign key (`belongs_to`).
    Owning,
    /// The child row (or a join table) holds the foreign key.
    Owned,
}

/// A join table used by many-to-many associations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    /// Name of the join table.
    pub table: String,
    /// Column referencing the parent side.
    pub source_column: String,
    /// Column referencing the child side.
    pub target_column: String,
    /// Column on the child table that `target_column` points at.
    pub target_key: String,
}

impl JoinTable {
    /// Create a new join table spec.
    pub fn new(
        table: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
            target_key: target_key.into(),
        }
    }

    /// The parent-side column, qualified by the join table.
    pub fn source(&self) -> ColumnKey {
        ColumnKey::qualified(&self.table, &self.source_column)
    }
}

/// The structural shape of an association.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationKind {
    /// The foreign key lives directly on one of the two tables.
    Direct,
    /// Rows are linked through an intermediate join table.
    Through(JoinTable),
    /// The child table is shared by several parent types and tagged with a
    /// discriminator column.
    Polymorphic {
        /// Discriminator column on the child table.
        type_column: String,
        /// Discriminator value identifying the parent type.
        type_value: String,
    },
}

/// Everything the loader needs to know about one association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationFacts {
    /// Association name, used as the field name on parent rows.
    pub name: String,
    /// Entity declaring the association.
    pub source_entity: String,
    /// Table of the declaring entity.
    pub source_table: String,
    /// Entity the association points at.
    pub target_entity: String,
    /// Table of the target entity.
    pub target_table: String,
    /// One or many.
    pub cardinality: Cardinality,
    /// Which side stores the foreign key.
    pub direction: Direction,
    /// Foreign key column (on the parent when owning, on the child or join
    /// table when owned).
    pub foreign_key: String,
    /// Primary key the foreign key references.
    pub primary_key: String,
    /// Direct, through a join table, or polymorphic.
    pub kind: AssociationKind,
    /// Extra predicate restricting the related rows.
    pub scope: Option<Filter>,
}

impl AssociationFacts {
    /// The column on parent rows whose values select the children.
    pub fn parent_key(&self) -> ColumnKey {
        match self.direction {
            Direction::Owning => ColumnKey::qualified(&self.source_table, &self.foreign_key),
            Direction::Owned => ColumnKey::qualified(&self.source_table, &self.primary_key),
        }
    }

    /// The column the child query filters on, carried back on child rows so
    /// they can be re-attached.
    pub fn child_key(&self) -> ColumnKey {
        match (&self.direction, &self.kind) {
            (Direction::Owning, _) => ColumnKey::qualified(&self.target_table, &self.primary_key),
            (Direction::Owned, AssociationKind::Through(join)) => join.source(),
            (Direction::Owned, _) => ColumnKey::qualified(&self.target_table, &self.foreign_key),
        }
    }

    /// The join table, if any.
    pub fn join_table(&self) -> Option<&JoinTable> {
        match &self.kind {
            AssociationKind::Through(join) => Some(join),
            _ => None,
        }
    }

    /// The discriminator column and value of a polymorphic association.
    pub fn discriminator(&self) -> Option<(ColumnKey, &str)> {
        match &self.kind {
            AssociationKind::Polymorphic {
                type_column,
                type_value,
            } => Some((
                ColumnKey::qualified(&self.target_table, type_column),
                type_value.as_str(),
            )),
            _ => None,
        }
    }
}

/// Source of association metadata.
///
/// Given an entity and an association name, yields the resolved
/// [`AssociationFacts`] or a configuration error when the name is unknown.
pub trait AssociationResolver: Send + Sync {
    /// Resolve `association` declared on `entity`.
    fn resolve(&self, entity: &str, association: &str) -> QueryResult<AssociationFacts>;
}

impl<T: AssociationResolver + ?Sized> AssociationResolver for &T {
    fn resolve(&self, entity: &str, association: &str) -> QueryResult<AssociationFacts> {
        (**self).resolve(entity, association)
    }
}

impl<T: AssociationResolver + ?Sized> AssociationResolver for std::sync::Arc<T> {
    fn resolve(&self, entity: &str, association: &str) -> QueryResult<AssociationFacts> {
        (**self).resolve(entity, association)
    }
}
