//! SQLite relation driver for deep-pluck.
//!
//! This crate runs pluck trees against SQLite, using `tokio-rusqlite`
//! for asynchronous database access.
//!
//! # Features
//!
//! - Async/await support via `tokio-rusqlite`
//! - One `SELECT ... WHERE key IN (...)` per association node
//! - Join tables rendered as `INNER JOIN`
//! - In-memory and file-based databases
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_pluck_query::{AssociationSpec, EntitySpec, Pluck, Schema};
//! use deep_pluck_sqlite::{SqliteConfig, SqliteConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = SqliteConnection::open(SqliteConfig::from_url("sqlite://./app.db")?).await?;
//!     let schema = Schema::new()
//!         .entity(EntitySpec::new("User", "users").association(AssociationSpec::has_many("posts", "Post")))
//!         .entity(EntitySpec::new("Post", "posts"));
//!
//!     let rows = Pluck::new(conn.relation("User", "users"), &schema)
//!         .add(("posts", "title"))?
//!         .load_all()
//!         .await?;
//!     println!("{:?}", rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod relation;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use connection::SqliteConnection;
pub use error::{SqliteError, SqliteResult};
pub use relation::SqliteRelation;
