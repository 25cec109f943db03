//! SQLite connection wrapper.

use std::fmt;

use tokio_rusqlite::Connection;
use tracing::{debug, info, instrument};

use deep_pluck_query::{Row, Value};

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::relation::SqliteRelation;
use crate::types::{from_sqlite, to_sqlite_params};

/// A handle to a SQLite database running on a background thread.
///
/// Cloning is cheap; clones share the same underlying connection.
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Connection,
    config: SqliteConfig,
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.config.path_str())
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Open a database and apply the configured pragmas.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = if config.path.is_memory() {
            Connection::open_in_memory().await?
        } else {
            Connection::open(config.path_str()).await?
        };

        let pragmas = config.clone();
        conn.call(move |conn| Ok(pragmas.apply(conn)?)).await?;

        info!(path = %config.path_str(), "Opened SQLite database");
        Ok(Self { conn, config })
    }

    /// Open a fresh in-memory database.
    pub async fn memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory()).await
    }

    /// Open a database from a URL such as `sqlite://app.db`.
    pub async fn from_url(url: &str) -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_url(url)?).await
    }

    /// The configuration this connection was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Run one or more statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        let sql = sql.to_string();
        debug!(sql = %sql, "Executing batch");

        self.conn
            .call(move |conn| Ok(conn.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)
    }

    /// Run a single statement with parameters, returning the affected rows.
    pub async fn execute_params(&self, sql: &str, params: Vec<Value>) -> SqliteResult<usize> {
        let sql = sql.to_string();
        let params = to_sqlite_params(&params)?;
        debug!(sql = %sql, params = params.len(), "Executing statement");

        self.conn
            .call(move |conn| {
                Ok(conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?)
            })
            .await
            .map_err(SqliteError::from)
    }

    /// Run a query with parameters, returning rows keyed by result column name.
    #[instrument(skip(self, params), fields(sql = %sql))]
    pub async fn query_params(&self, sql: &str, params: Vec<Value>) -> SqliteResult<Vec<Row>> {
        let sql = sql.to_string();
        let params = to_sqlite_params(&params)?;
        debug!(params = params.len(), "Executing parameterized query");

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let columns: Vec<String> = stmt
                    .column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect();

                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    let mut out = Row::with_capacity(columns.len());
                    for (i, col) in columns.iter().enumerate() {
                        out.insert(col.clone(), from_sqlite(row.get_ref(i)?));
                    }
                    Ok(out)
                })?;

                let results: Result<Vec<_>, _> = rows.collect();
                Ok(results?)
            })
            .await
            .map_err(SqliteError::from)
    }

    /// A relation over `table`, loading rows of `entity`.
    pub fn relation(&self, entity: &str, table: &str) -> SqliteRelation {
        SqliteRelation::new(self.clone(), entity, table)
    }

    /// Get the underlying async connection.
    pub fn inner(&self) -> &Connection {
        &self.conn
    }
}
