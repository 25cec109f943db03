//! # deep-pluck
//!
//! Load nested associations as plain rows, one query per association.
//!
//! deep-pluck provides:
//! - Declarative, nested pluck specifications
//! - Association metadata for `belongs_to`, `has_one`, `has_many`,
//!   `has_many :through`, many-to-many and polymorphic associations
//! - Batched loading keyed on distinct parent values, so a tree with `N`
//!   association nodes issues exactly `N + 1` queries
//! - Removal of columns that were only fetched to join rows together
//! - An in-memory store and a SQLite driver
//!
//! ## Quick Start
//!
//! ```rust
//! use deep_pluck::prelude::*;
//! use deep_pluck::MemoryStore;
//!
//! let schema = Schema::new()
//!     .entity(EntitySpec::new("User", "users").association(AssociationSpec::has_many("posts", "Post")))
//!     .entity(EntitySpec::new("Post", "posts"));
//!
//! let store = MemoryStore::new();
//! store.insert("users", row! { "id" => 1, "name" => "alice" });
//! store.insert("posts", row! { "id" => 1, "user_id" => 1, "title" => "hello" });
//!
//! # block_on(async {
//! let rows = Pluck::new(store.relation("User", "users"), &schema)
//!     .add(PluckSpec::from("name").and(("posts", "title")))?
//!     .load_all()
//!     .await?;
//!
//! assert_eq!(
//!     rows,
//!     vec![row! { "name" => "alice", "posts" => vec![row! { "title" => "hello" }] }]
//! );
//! # Ok::<(), QueryError>(())
//! # }).unwrap();
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use deep_pluck_query::*;

/// SQLite driver.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use deep_pluck_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use deep_pluck_query::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use crate::sqlite::{SqliteConfig, SqliteConnection};
}
