//! Declarative association registry.
//!
//! [`Schema`] is the shipped [`AssociationResolver`]. Entities are declared
//! with their table and primary key; associations are declared with
//! `belongs_to`, `has_one`, `has_many` and `has_and_belongs_to_many` and the
//! usual naming conventions fill in whatever is not given explicitly:
//!
//! | Declaration | Foreign key default | Holder |
//! |-------------|---------------------|--------|
//! | `belongs_to("user", "User")` | `user_id` | parent |
//! | `has_many("posts", "Post")` on `User` | `user_id` | child |
//! | `has_many("notes", "Note").as_polymorphic("parent")` | `parent_id` + `parent_type` | child |
//! | `has_many("achievements", "Achievement").through("user_achievements")` | from the through association | join table |
//! | `has_and_belongs_to_many("tags", "Tag")` | `post_id` / `tag_id` | join table |
//!
//! ```rust
//! use deep_pluck_query::relations::{AssociationResolver, AssociationSpec, EntitySpec, Schema};
//!
//! let schema = Schema::new()
//!     .entity(EntitySpec::new("User", "users").association(AssociationSpec::has_many("posts", "Post")))
//!     .entity(EntitySpec::new("Post", "posts").association(AssociationSpec::belongs_to("user", "User")));
//!
//! let facts = schema.resolve("User", "posts").unwrap();
//! assert_eq!(facts.foreign_key, "user_id");
//! assert!(schema.resolve("User", "postz").is_err());
//! ```

use std::collections::HashMap;

use convert_case::{Case, Casing};
use indexmap::IndexMap;

use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;

use super::spec::{
    AssociationFacts, AssociationKind, AssociationResolver, Cardinality, Direction, JoinTable,
};

/// The declaration form of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationMacro {
    /// The declaring entity holds the foreign key.
    BelongsTo,
    /// The target holds a foreign key back to the declaring entity; one row.
    HasOne,
    /// The target holds a foreign key back to the declaring entity; many rows.
    HasMany,
    /// Both sides are linked through a join table.
    HasAndBelongsToMany,
}

/// An association as declared, before conventions are applied.
#[derive(Debug, Clone)]
pub struct AssociationSpec {
    /// Association name.
    pub name: String,
    /// Declaration form.
    pub macro_kind: AssociationMacro,
    /// Target entity name.
    pub target: String,
    /// Explicit foreign key.
    pub foreign_key: Option<String>,
    /// Explicit primary key.
    pub primary_key: Option<String>,
    /// Explicit target-side column of a join table.
    pub association_foreign_key: Option<String>,
    /// Polymorphic interface name (`as:`).
    pub polymorphic_as: Option<String>,
    /// Name of the association to go through.
    pub through: Option<String>,
    /// Name of the association on the through entity that reaches the target.
    pub source: Option<String>,
    /// Explicit join table for `has_and_belongs_to_many`.
    pub join_table: Option<String>,
    /// Restricting predicate.
    pub scope: Option<Filter>,
}

impl AssociationSpec {
    fn new(name: impl Into<String>, macro_kind: AssociationMacro, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            macro_kind,
            target: target.into(),
            foreign_key: None,
            primary_key: None,
            association_foreign_key: None,
            polymorphic_as: None,
            through: None,
            source: None,
            join_table: None,
            scope: None,
        }
    }

    /// Declare a `belongs_to` association.
    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, AssociationMacro::BelongsTo, target)
    }

    /// Declare a `has_one` association.
    pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, AssociationMacro::HasOne, target)
    }

    /// Declare a `has_many` association.
    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, AssociationMacro::HasMany, target)
    }

    /// Declare a `has_and_belongs_to_many` association.
    pub fn has_and_belongs_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, AssociationMacro::HasAndBelongsToMany, target)
    }

    /// Set the foreign key column.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Set the referenced primary key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Set the target-side column of the join table.
    pub fn association_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.association_foreign_key = Some(column.into());
        self
    }

    /// Make this association polymorphic under the given interface name.
    pub fn as_polymorphic(mut self, name: impl Into<String>) -> Self {
        self.polymorphic_as = Some(name.into());
        self
    }

    /// Reach the target through another association of the declaring entity.
    pub fn through(mut self, association: impl Into<String>) -> Self {
        self.through = Some(association.into());
        self
    }

    /// Name the association on the through entity that reaches the target.
    pub fn source(mut self, association: impl Into<String>) -> Self {
        self.source = Some(association.into());
        self
    }

    /// Set the join table of a `has_and_belongs_to_many` association.
    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    /// Restrict the related rows with a predicate.
    pub fn scope(mut self, filter: Filter) -> Self {
        self.scope = Some(filter);
        self
    }
}

/// An entity: a table, its primary key, and its associations.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    /// Entity name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Primary key column.
    pub primary_key: String,
    /// Declared associations.
    pub associations: IndexMap<String, AssociationSpec>,
}

impl EntitySpec {
    /// Create an entity with the default `id` primary key.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            associations: IndexMap::new(),
        }
    }

    /// Set the primary key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Declare an association.
    pub fn association(mut self, spec: AssociationSpec) -> Self {
        self.associations.insert(spec.name.clone(), spec);
        self
    }
}

/// Registry of entities and their associations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, EntitySpec>,
}

impl Schema {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity.
    pub fn entity(mut self, spec: EntitySpec) -> Self {
        self.register(spec);
        self
    }

    /// Register an entity in place.
    pub fn register(&mut self, spec: EntitySpec) {
        self.entities.insert(spec.name.clone(), spec);
    }

    /// Look up an entity.
    pub fn get(&self, entity: &str) -> QueryResult<&EntitySpec> {
        self.entities
            .get(entity)
            .ok_or_else(|| QueryError::unknown_entity(entity))
    }

    /// Iterate over all registered entities.
    pub fn entities(&self) -> impl Iterator<Item = &EntitySpec> {
        self.entities.values()
    }

    fn target_of(&self, source: &EntitySpec, spec: &AssociationSpec) -> QueryResult<&EntitySpec> {
        self.entities.get(&spec.target).ok_or_else(|| {
            QueryError::invalid_configuration(format!(
                "Association '{}' on {} points at unregistered entity '{}'",
                spec.name, source.name, spec.target
            ))
            .with_entity(&source.name)
            .with_association(&spec.name)
        })
    }

    fn resolve_through(
        &self,
        source: &EntitySpec,
        spec: &AssociationSpec,
        through_name: &str,
        target: &EntitySpec,
        cardinality: Cardinality,
    ) -> QueryResult<AssociationFacts> {
        let through = self.resolve(&source.name, through_name).map_err(|err| {
            QueryError::invalid_configuration(format!(
                "Association '{}' on {} goes through '{}', which cannot be resolved: {}",
                spec.name, source.name, through_name, err.message
            ))
            .with_entity(&source.name)
            .with_association(&spec.name)
        })?;
        if through.direction != Direction::Owned || through.kind != AssociationKind::Direct {
            return Err(QueryError::invalid_configuration(format!(
                "Association '{}' on {} goes through '{}', which must be a plain has_one/has_many",
                spec.name, source.name, through_name
            ))
            .with_entity(&source.name)
            .with_association(&spec.name));
        }

        let join_entity = self.get(&through.target_entity)?;
        let candidates: Vec<String> = match &spec.source {
            Some(name) => vec![name.clone()],
            None => vec![spec.name.clone(), singularize(&spec.name)],
        };
        let link_name = candidates
            .iter()
            .find(|name| {
                join_entity.associations.get(name.as_str()).is_some_and(|a| {
                    a.macro_kind == AssociationMacro::BelongsTo && a.target == target.name
                })
            })
            .ok_or_else(|| {
                QueryError::invalid_configuration(format!(
                    "Could not find a belongs_to '{}' on {} to go through for '{}'",
                    candidates.join("' or '"),
                    join_entity.name,
                    spec.name
                ))
                .with_entity(&source.name)
                .with_association(&spec.name)
                .with_suggestion("Name the link explicitly with AssociationSpec::source()")
            })?;
        let link = self.resolve(&join_entity.name, link_name)?;

        let join = JoinTable::new(
            join_entity.table.clone(),
            through.foreign_key.clone(),
            link.foreign_key,
            link.primary_key,
        );

        Ok(AssociationFacts {
            name: spec.name.clone(),
            source_entity: source.name.clone(),
            source_table: source.table.clone(),
            target_entity: target.name.clone(),
            target_table: target.table.clone(),
            cardinality,
            direction: Direction::Owned,
            foreign_key: through.foreign_key,
            primary_key: through.primary_key,
            kind: AssociationKind::Through(join),
            scope: spec.scope.clone(),
        })
    }
}

impl AssociationResolver for Schema {
    fn resolve(&self, entity: &str, association: &str) -> QueryResult<AssociationFacts> {
        let source = self.get(entity)?;
        let spec = source
            .associations
            .get(association)
            .ok_or_else(|| QueryError::unknown_association(entity, association))?;
        let target = self.target_of(source, spec)?;

        let facts = |cardinality, direction, foreign_key: String, primary_key: String, kind| {
            AssociationFacts {
                name: spec.name.clone(),
                source_entity: source.name.clone(),
                source_table: source.table.clone(),
                target_entity: target.name.clone(),
                target_table: target.table.clone(),
                cardinality,
                direction,
                foreign_key,
                primary_key,
                kind,
                scope: spec.scope.clone(),
            }
        };

        match spec.macro_kind {
            AssociationMacro::BelongsTo => {
                if spec.polymorphic_as.is_some() {
                    return Err(QueryError::invalid_configuration(format!(
                        "Polymorphic belongs_to '{}' on {} has no single target to load",
                        spec.name, source.name
                    ))
                    .with_entity(&source.name)
                    .with_association(&spec.name));
                }
                let fk = spec
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", spec.name.to_case(Case::Snake)));
                let pk = spec
                    .primary_key
                    .clone()
                    .unwrap_or_else(|| target.primary_key.clone());
                Ok(facts(Cardinality::One, Direction::Owning, fk, pk, AssociationKind::Direct))
            }
            AssociationMacro::HasOne | AssociationMacro::HasMany => {
                let cardinality = if spec.macro_kind == AssociationMacro::HasOne {
                    Cardinality::One
                } else {
                    Cardinality::Many
                };
                if let Some(through) = &spec.through {
                    return self.resolve_through(source, spec, through, target, cardinality);
                }
                let pk = spec
                    .primary_key
                    .clone()
                    .unwrap_or_else(|| source.primary_key.clone());
                match &spec.polymorphic_as {
                    Some(as_name) => {
                        let fk = spec
                            .foreign_key
                            .clone()
                            .unwrap_or_else(|| format!("{}_id", as_name));
                        let kind = AssociationKind::Polymorphic {
                            type_column: format!("{}_type", as_name),
                            type_value: source.name.clone(),
                        };
                        Ok(facts(cardinality, Direction::Owned, fk, pk, kind))
                    }
                    None => {
                        let fk = spec
                            .foreign_key
                            .clone()
                            .unwrap_or_else(|| foreign_key_for(&source.name));
                        Ok(facts(cardinality, Direction::Owned, fk, pk, AssociationKind::Direct))
                    }
                }
            }
            AssociationMacro::HasAndBelongsToMany => {
                let table = spec
                    .join_table
                    .clone()
                    .unwrap_or_else(|| derive_join_table(&source.table, &target.table));
                let source_column = spec
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| foreign_key_for(&source.name));
                let target_column = spec
                    .association_foreign_key
                    .clone()
                    .unwrap_or_else(|| foreign_key_for(&target.name));
                let pk = spec
                    .primary_key
                    .clone()
                    .unwrap_or_else(|| source.primary_key.clone());
                let join = JoinTable::new(
                    table,
                    source_column.clone(),
                    target_column,
                    target.primary_key.clone(),
                );
                Ok(facts(
                    Cardinality::Many,
                    Direction::Owned,
                    source_column,
                    pk,
                    AssociationKind::Through(join),
                ))
            }
        }
    }
}

fn foreign_key_for(entity: &str) -> String {
    format!("{}_id", entity.to_case(Case::Snake))
}

fn derive_join_table(a: &str, b: &str) -> String {
    let mut tables = [a, b];
    tables.sort_unstable();
    tables.join("_")
}

fn singularize(name: &str) -> String {
    name.strip_suffix('s').unwrap_or(name).to_string()
}
