//! Classifies failures into retry decisions and logs them with a
//! correlation id.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::constants::{
    CONNECTION_RETRY_DELAY, DEADLOCK_RETRY_DELAY, SERIALIZATION_RETRY_DELAY,
    TIMEOUT_RETRY_DELAY, TOO_MANY_CONNECTIONS_RETRY_DELAY,
};
use crate::error::{MigrationError, PgShiftError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SerializationFailure,
    Deadlock,
    TooManyConnections,
    Connection,
    Timeout,
    Authentication,
    Pool,
    SchemaExtraction,
    Comparison,
    Migration,
    Validation,
    Database,
    Configuration,
    Io,
    Cancellation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SerializationFailure => "serialization failure",
            ErrorKind::Deadlock => "deadlock",
            ErrorKind::TooManyConnections => "too many connections",
            ErrorKind::Connection => "connection",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Pool => "pool",
            ErrorKind::SchemaExtraction => "schema extraction",
            ErrorKind::Comparison => "comparison",
            ErrorKind::Migration => "migration",
            ErrorKind::Validation => "validation",
            ErrorKind::Database => "database",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Io => "io",
            ErrorKind::Cancellation => "cancellation",
        };
        f.write_str(name)
    }
}

/// Retry decision for one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    pub retryable: bool,
    /// Suggested wait before the next attempt; `None` leaves it to the policy
    pub delay: Option<Duration>,
    pub correlation_id: Uuid,
}

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "transient",
    "temporar",
    "connection reset",
];

fn kind_from_sqlstate(code: &str) -> Option<ErrorKind> {
    match code {
        "40001" => Some(ErrorKind::SerializationFailure),
        "40P01" => Some(ErrorKind::Deadlock),
        "53300" => Some(ErrorKind::TooManyConnections),
        "57P01" | "57P02" | "57P03" => Some(ErrorKind::Connection),
        "57014" | "55P03" => Some(ErrorKind::Timeout),
        c if c.starts_with("08") => Some(ErrorKind::Connection),
        c if c.starts_with("28") => Some(ErrorKind::Authentication),
        _ => None,
    }
}

fn kind_of(err: &PgShiftError) -> ErrorKind {
    if let Some(kind) = err.sqlstate().and_then(kind_from_sqlstate) {
        return kind;
    }

    match err {
        PgShiftError::Connection(_) => ErrorKind::Connection,
        PgShiftError::Unauthorized(_) => ErrorKind::Authentication,
        PgShiftError::Database { .. } => ErrorKind::Database,
        PgShiftError::Timeout(_) => ErrorKind::Timeout,
        PgShiftError::Pool { .. } => ErrorKind::Pool,
        PgShiftError::SchemaExtraction { .. } => ErrorKind::SchemaExtraction,
        PgShiftError::Comparison(_) => ErrorKind::Comparison,
        PgShiftError::Migration(_) => ErrorKind::Migration,
        PgShiftError::Validation(_) | PgShiftError::Split(_) => ErrorKind::Validation,
        PgShiftError::Cancelled => ErrorKind::Cancellation,
        PgShiftError::Config(_) => ErrorKind::Configuration,
        PgShiftError::Io(_) | PgShiftError::Json(_) | PgShiftError::Yaml(_) => ErrorKind::Io,
    }
}

fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
}

pub struct ErrorHandler;

impl ErrorHandler {
    pub fn classify(err: &PgShiftError) -> ErrorClassification {
        let kind = kind_of(err);

        let (retryable, delay) = match kind {
            ErrorKind::SerializationFailure => (true, Some(SERIALIZATION_RETRY_DELAY)),
            ErrorKind::Deadlock => (true, Some(DEADLOCK_RETRY_DELAY)),
            ErrorKind::TooManyConnections => (true, Some(TOO_MANY_CONNECTIONS_RETRY_DELAY)),
            ErrorKind::Connection => (true, Some(CONNECTION_RETRY_DELAY)),
            ErrorKind::Timeout => (true, Some(TIMEOUT_RETRY_DELAY)),
            ErrorKind::SchemaExtraction => match err {
                PgShiftError::SchemaExtraction { message, .. } => {
                    (is_transient_message(message), None)
                }
                _ => (false, None),
            },
            ErrorKind::Authentication
            | ErrorKind::Pool
            | ErrorKind::Comparison
            | ErrorKind::Migration
            | ErrorKind::Validation
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Io
            | ErrorKind::Cancellation => (false, None),
        };

        ErrorClassification {
            kind,
            retryable,
            delay,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Classify and log a failure of `operation`
    pub fn handle(operation: &str, err: &PgShiftError) -> ErrorClassification {
        let classification = Self::classify(err);
        let correlation_id = classification.correlation_id;

        if classification.kind == ErrorKind::Cancellation {
            debug!(%correlation_id, operation, "Operation cancelled");
        } else if classification.retryable {
            warn!(
                %correlation_id,
                operation,
                kind = %classification.kind,
                "Transient failure: {}",
                err
            );
        } else {
            let statement = match err {
                PgShiftError::Migration(MigrationError::StatementFailed { index, .. }) => {
                    Some(*index)
                }
                _ => None,
            };
            error!(
                %correlation_id,
                operation,
                kind = %classification.kind,
                statement,
                "{}",
                err
            );
        }

        classification
    }
}
