//! # deep-pluck-query
//!
//! Association tree planner, batched loader and row merger.
//!
//! This crate provides the core of deep-pluck:
//! - Declarative pluck specifications (`PluckSpec`)
//! - Association metadata (`Schema`, `AssociationResolver`)
//! - Column planning per tree node, deduplicated by canonical key
//! - One batched query per association node, keyed on distinct parent values
//! - Merging child rows into parents and pruning join-only columns
//! - An in-memory `Relation` store for tests and prototyping
//!
//! ## Canonical Keys
//!
//! Qualified and bare column references share a key:
//!
//! ```rust
//! use deep_pluck_query::relations::{ColumnKey, canonical_key};
//!
//! assert_eq!(canonical_key("user_achievements.user_id"), "user_id");
//! assert!(ColumnKey::new("posts.id").same_key(&ColumnKey::new("id")));
//! ```
//!
//! ## Specifications
//!
//! Specs nest like the output they produce:
//!
//! ```rust
//! use deep_pluck_query::PluckSpec;
//!
//! // name, posts: [title, post_comments: comment]
//! let spec = PluckSpec::from("name")
//!     .and(("posts", PluckSpec::from("title").and(("post_comments", "comment"))));
//! assert_eq!(spec.columns().collect::<Vec<_>>(), vec!["name"]);
//! ```
//!
//! ## Scopes
//!
//! Association scopes are plain filters:
//!
//! ```rust
//! use deep_pluck_query::Filter;
//!
//! let scope = Filter::or([
//!     Filter::ends_with("title", "post1"),
//!     Filter::ends_with("title", "post3"),
//! ]);
//! assert!(!scope.is_none());
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use deep_pluck_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_association("User", "postz");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! assert!(err.is_configuration_error());
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod memory;
pub mod relations;
#[macro_use]
pub mod row;
pub mod traits;
pub mod value;

pub use config::{MultipleMatchPolicy, PluckConfig};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::Filter;
pub use memory::{ExecutedQuery, MemoryRelation, MemoryStore};
pub use relations::{
    AssociationFacts, AssociationKind, AssociationResolver, AssociationSpec, Cardinality,
    ColumnKey, Direction, EntitySpec, JoinTable, Node, Pluck, PluckSpec, Schema,
};
pub use row::{Row, RowExt};
pub use traits::Relation;
pub use value::{KeyValue, Value};

// Re-export logging utilities
pub use logging::{
    get_log_format, get_log_level, init as init_logging, init_debug, init_with_level,
    is_debug_enabled,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{MultipleMatchPolicy, PluckConfig};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::Filter;
    pub use crate::relations::{
        AssociationResolver, AssociationSpec, EntitySpec, Pluck, PluckSpec, Schema,
    };
    pub use crate::row::{Row, RowExt};
    pub use crate::traits::Relation;
    pub use crate::value::Value;
    pub use crate::row;
}
