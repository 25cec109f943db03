//! Nested association loading.
//!
//! This module provides the pieces of a deep pluck:
//! - [`PluckSpec`] for declaring which columns and associations to load
//! - [`Schema`] and [`AssociationResolver`] for association metadata
//! - [`Node`] for the association tree and its column planner
//! - [`Pluck`] for running the batched load, merge and prune
//!
//! ## Example
//!
//! ```rust,ignore
//! // users with the titles of their posts and each post's comments
//! let users = Pluck::new(store.relation("User", "users"), &schema)
//!     .add(PluckSpec::from("name").and(("posts", PluckSpec::from("title").and(("post_comments", "comment")))))?
//!     .load_all()
//!     .await?;
//!
//! // one query for users, one for posts, one for comments
//! ```

mod combine;
mod include;
mod key;
mod loader;
mod node;
mod pluck;
mod prune;
mod schema;
mod spec;

pub use combine::combine_data;
pub use include::PluckSpec;
pub use key::{ColumnKey, canonical_key, dedup_by_key};
pub use node::Node;
pub use pluck::Pluck;
pub use schema::{AssociationMacro, AssociationSpec, EntitySpec, Schema};
pub use spec::{
    AssociationFacts, AssociationKind, AssociationResolver, Cardinality, Direction, JoinTable,
};
