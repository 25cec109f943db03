//! Loader configuration.
//!
//! [`PluckConfig`] can be built in code, deserialized from any serde format
//! (for example a `[pluck]` table in a TOML file) or read from the
//! environment:
//!
//! | Variable | Field | Values |
//! |----------|-------|--------|
//! | `PLUCK_BATCH_SIZE` | `batch_size` | positive integer |
//! | `PLUCK_SIBLING_CONCURRENCY` | `sibling_concurrency` | positive integer |
//! | `PLUCK_ON_MULTIPLE_MATCHES` | `on_multiple_matches` | `error`, `first` |
//!
//! ```rust
//! use deep_pluck_query::config::{MapEnvSource, MultipleMatchPolicy, PluckConfig};
//!
//! let env = MapEnvSource::new()
//!     .set("PLUCK_BATCH_SIZE", "500")
//!     .set("PLUCK_ON_MULTIPLE_MATCHES", "first");
//! let config = PluckConfig::from_env_source(&env).unwrap();
//! assert_eq!(config.batch_size, Some(500));
//! assert_eq!(config.on_multiple_matches, MultipleMatchPolicy::First);
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// What to do when a singular association matches more than one child row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipleMatchPolicy {
    /// Fail the load with a `NotUnique` error.
    #[default]
    Error,
    /// Keep the first match in child row order and log a warning.
    First,
}

impl FromStr for MultipleMatchPolicy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "first" => Ok(Self::First),
            other => Err(QueryError::invalid_configuration(format!(
                "Unknown multiple match policy '{}'",
                other
            ))
            .with_suggestion("Use 'error' or 'first'")),
        }
    }
}

/// Tuning knobs for a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluckConfig {
    /// Split parent key sets into chunks of at most this many values, one
    /// query per chunk. `None` issues exactly one query per node.
    pub batch_size: Option<usize>,
    /// How many sibling associations may load at the same time.
    pub sibling_concurrency: usize,
    /// Policy for singular associations with several matches.
    pub on_multiple_matches: MultipleMatchPolicy,
}

impl Default for PluckConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            sibling_concurrency: 1,
            on_multiple_matches: MultipleMatchPolicy::Error,
        }
    }
}

impl PluckConfig {
    /// Environment variable for [`batch_size`](Self::batch_size).
    pub const BATCH_SIZE_ENV: &'static str = "PLUCK_BATCH_SIZE";
    /// Environment variable for [`sibling_concurrency`](Self::sibling_concurrency).
    pub const SIBLING_CONCURRENCY_ENV: &'static str = "PLUCK_SIBLING_CONCURRENCY";
    /// Environment variable for [`on_multiple_matches`](Self::on_multiple_matches).
    pub const ON_MULTIPLE_MATCHES_ENV: &'static str = "PLUCK_ON_MULTIPLE_MATCHES";

    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> QueryResult<Self> {
        Self::from_env_source(&StdEnvSource)
    }

    /// Read the configuration from an environment source.
    pub fn from_env_source<S: EnvSource>(env: &S) -> QueryResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = read_var(env, Self::BATCH_SIZE_ENV)? {
            config.batch_size = Some(parse_positive(Self::BATCH_SIZE_ENV, &raw)?);
        }
        if let Some(raw) = read_var(env, Self::SIBLING_CONCURRENCY_ENV)? {
            config.sibling_concurrency = parse_positive(Self::SIBLING_CONCURRENCY_ENV, &raw)?;
        }
        if let Some(raw) = read_var(env, Self::ON_MULTIPLE_MATCHES_ENV)? {
            config.on_multiple_matches = raw.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Set the sibling concurrency.
    pub fn with_sibling_concurrency(mut self, concurrency: usize) -> Self {
        self.sibling_concurrency = concurrency;
        self
    }

    /// Set the multiple match policy.
    pub fn with_multiple_match_policy(mut self, policy: MultipleMatchPolicy) -> Self {
        self.on_multiple_matches = policy;
        self
    }

    /// Check the configuration for values the loader cannot use.
    pub fn validate(&self) -> QueryResult<()> {
        if self.batch_size == Some(0) {
            return Err(QueryError::invalid_configuration("batch_size must be at least 1")
                .with_suggestion("Leave batch_size unset to issue one query per node"));
        }
        if self.sibling_concurrency == 0 {
            return Err(QueryError::invalid_configuration(
                "sibling_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A variable that is set must carry a value.
fn read_var<S: EnvSource>(env: &S, name: &str) -> QueryResult<Option<String>> {
    match env.get(name) {
        Some(raw) if raw.trim().is_empty() => Err(QueryError::missing_configuration(format!(
            "{} is set but empty",
            name
        ))
        .with_suggestion(format!("Unset {} to use the default", name))),
        other => Ok(other),
    }
}

fn parse_positive(name: &str, raw: &str) -> QueryResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(QueryError::invalid_configuration(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Default environment source using `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
