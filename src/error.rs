//! Error types shared by the comparison, generation and execution layers.

use crate::catalog::ObjectType;
use thiserror::Error;

/// Main error type for library operations.
#[derive(Error, Debug)]
pub enum PgShiftError {
    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Server rejected the credentials
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Error reported by the server, with its SQLSTATE when present
    #[error("Database error{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Database {
        code: Option<String>,
        message: String,
    },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Metadata extraction failed for one object type
    #[error("Schema extraction failed for {object_type}: {message}")]
    SchemaExtraction {
        object_type: ObjectType,
        message: String,
    },

    #[error("Comparison failed: {0}")]
    Comparison(String),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Split(#[from] SplitError),

    /// Operation was cancelled (Ctrl-C, caller token)
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures while turning differences into scripts, or while running them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("{object_type} {object} is missing required metadata '{field}'")]
    MissingMetadata {
        object_type: ObjectType,
        object: String,
        field: String,
    },

    #[error("{object_type} {object} has no {side} object to render")]
    MissingObject {
        object_type: ObjectType,
        object: String,
        side: &'static str,
    },

    #[error(
        "Dependency cycle detected involving {0}. Check for circular references between the selected objects."
    )]
    DependencyCycle(String),

    #[error("{0} migrations are not supported; only schema changes can be generated")]
    UnsupportedMigrationType(String),

    /// A statement failed while the script was running inside its transaction
    #[error("Statement {index} of {total} failed: {message}\n  Statement: {statement}")]
    StatementFailed {
        index: usize,
        total: usize,
        statement: String,
        message: String,
        code: Option<String>,
    },
}

/// Failures while splitting a script into statements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("Unterminated dollar-quoted string {tag} opened at line {line}")]
    UnterminatedDollarQuote { tag: String, line: usize },

    #[error("Unterminated quoted {kind} opened at line {line}")]
    UnterminatedQuote { kind: &'static str, line: usize },

    #[error("Unterminated block comment opened at line {line}")]
    UnterminatedComment { line: usize },
}

impl PgShiftError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl Into<String>, context: impl Into<String>) -> Self {
        PgShiftError::Pool {
            message: message.into(),
            context: context.into(),
        }
    }

    pub fn extraction(object_type: ObjectType, message: impl Into<String>) -> Self {
        PgShiftError::SchemaExtraction {
            object_type,
            message: message.into(),
        }
    }

    /// SQLSTATE carried by this error, if any
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            PgShiftError::Database { code, .. } => code.as_deref(),
            PgShiftError::Migration(MigrationError::StatementFailed { code, .. }) => {
                code.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PgShiftError::Cancelled)
    }
}

impl From<sqlx::Error> for PgShiftError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_error) => {
                let code = db_error.code().map(|c| c.into_owned());
                let message = db_error.message().to_string();
                if code.as_deref().is_some_and(|c| c.starts_with("28")) {
                    PgShiftError::Unauthorized(message)
                } else {
                    PgShiftError::Database { code, message }
                }
            }
            sqlx::Error::PoolTimedOut => {
                PgShiftError::Timeout("timed out waiting for a pooled connection".to_string())
            }
            sqlx::Error::Io(e) => PgShiftError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => PgShiftError::Connection(e.to_string()),
            sqlx::Error::PoolClosed => PgShiftError::Connection("pool is closed".to_string()),
            sqlx::Error::WorkerCrashed => {
                PgShiftError::Connection("connection worker crashed".to_string())
            }
            sqlx::Error::Protocol(message) => PgShiftError::Connection(message),
            sqlx::Error::Configuration(e) => PgShiftError::Config(e.to_string()),
            other => PgShiftError::Database {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PgShiftError>;
