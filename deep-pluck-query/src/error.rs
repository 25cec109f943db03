//! Error types for plucking operations with actionable messages.
//!
//! Every error carries:
//! - An error code for programmatic handling
//! - Suggestions for fixing the issue
//! - Context about which entity, association or column was involved
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Result shape errors (multiple matches, invalid pluck spec)
//! - 3xxx: Connection errors
//! - 5xxx: Execution errors raised by the underlying store
//! - 6xxx: Data errors (type, deserialization)
//! - 7xxx: Configuration errors (unknown association, bad metadata)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use deep_pluck_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::unknown_association("User", "postz");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! assert!(err.is_configuration_error());
//! assert!(err.to_string().contains("postz"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for plucking operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Result shape errors (1xxx)
    /// Multiple records matched a singular association (P1002).
    NotUnique = 1002,
    /// Invalid pluck specification (P1004).
    InvalidSelect = 1004,

    // Connection errors (3xxx)
    /// Database connection failed (P3001).
    ConnectionFailed = 3001,

    // Query execution errors (5xxx)
    /// SQL syntax error (P5002).
    SqlSyntax = 5002,
    /// General database error (P5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Invalid data type (P6001).
    InvalidDataType = 6001,
    /// Deserialization error (P6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,
    /// Missing configuration (P7002).
    MissingConfiguration = 7002,
    /// Association name not declared on the entity (P7004).
    UnknownAssociation = 7004,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P7004").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotUnique => "Multiple records found",
            Self::InvalidSelect => "Invalid pluck specification",
            Self::ConnectionFailed => "Database connection failed",
            Self::SqlSyntax => "SQL syntax error",
            Self::DatabaseError => "Database error",
            Self::InvalidDataType => "Invalid data type",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::MissingConfiguration => "Missing configuration",
            Self::UnknownAssociation => "Unknown association",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The entity involved.
    pub entity: Option<String>,
    /// The association involved.
    pub association: Option<String>,
    /// The SQL query (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while building or loading a pluck tree.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the association.
    pub fn with_association(mut self, association: impl Into<String>) -> Self {
        self.context.association = Some(association.into());
        self
    }

    /// Set the SQL query.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// An association name that the entity does not declare.
    pub fn unknown_association(entity: impl Into<String>, association: impl Into<String>) -> Self {
        let entity = entity.into();
        let association = association.into();
        Self::new(
            ErrorCode::UnknownAssociation,
            format!(
                "Association named '{}' was not found on {}; perhaps you misspelled it?",
                association, entity
            ),
        )
        .with_entity(&entity)
        .with_association(&association)
        .with_suggestion(format!(
            "Declare '{}' on {} in the schema before plucking it",
            association, entity
        ))
    }

    /// An entity that is not registered with the resolver.
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Entity '{}' is not registered in the schema", entity),
        )
        .with_entity(&entity)
        .with_suggestion("Register the entity with Schema::entity() before resolving associations")
    }

    /// A singular association matched more than one child row.
    pub fn not_unique(association: impl Into<String>, key: impl fmt::Display, matches: usize) -> Self {
        let association = association.into();
        Self::new(
            ErrorCode::NotUnique,
            format!(
                "Expected at most one '{}' record for key {} but found {}",
                association, key, matches
            ),
        )
        .with_association(&association)
        .with_suggestion("Add a scope to the association so it matches a single row")
        .with_suggestion("Declare the association as a collection if several rows are expected")
        .with_code_suggestion(
            "Or keep the first match instead of failing",
            "PluckConfig::default().with_multiple_match_policy(MultipleMatchPolicy::First)",
        )
    }

    /// An invalid pluck specification.
    pub fn invalid_select(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSelect, message.into())
            .with_suggestion("Use column names, lists, or maps of association name to nested specs")
    }

    /// Invalid configuration or association metadata.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// A required configuration value is missing.
    pub fn missing_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingConfiguration, message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ConnectionFailed, format!("Connection error: {}", message))
            .with_suggestion("Check that the database is reachable")
    }

    /// Create a SQL syntax error.
    pub fn sql_syntax(message: impl Into<String>, sql: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::SqlSyntax, format!("SQL syntax error: {}", message))
            .with_sql(sql)
            .with_suggestion("Check the columns requested and the scope predicates")
    }

    /// Create a data type error.
    pub fn invalid_data_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDataType, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize: {}", message),
        )
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the database logs for more details")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
            .with_help("This is likely a bug in deep-pluck - please report it")
    }

    // ============== Error Checks ==============

    /// Check if this error was raised before any query ran.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidConfiguration
                | ErrorCode::MissingConfiguration
                | ErrorCode::UnknownAssociation
                | ErrorCode::InvalidSelect
        )
    }

    /// Check if this is a data-integrity error.
    pub fn is_not_unique(&self) -> bool {
        self.code == ErrorCode::NotUnique
    }

    /// Check if this error came from the underlying store.
    pub fn is_database_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::DatabaseError | ErrorCode::SqlSyntax | ErrorCode::ConnectionFailed
        )
    }

    // ============== Display Functions ==============

    /// Get the error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.code
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  → Entity: {}\n", entity));
        }
        if let Some(ref association) = self.context.association {
            output.push_str(&format!("  → Association: {}\n", association));
        }

        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.len() > 200 {
                format!("{}...", &sql[..200])
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
