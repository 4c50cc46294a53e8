//! Rich context for statements the server rejected.

use sqlx::postgres::{PgDatabaseError, PgErrorPosition};

use crate::error::MigrationError;

/// What PostgreSQL reported about a failed statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlErrorContext {
    pub message: String,
    /// Line within the statement, from the reported character position
    pub line_number: Option<usize>,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// PL/pgSQL call stack and similar
    pub context: Option<String>,
    /// SQLSTATE, e.g. `42P01` for undefined_table
    pub code: Option<String>,
}

impl SqlErrorContext {
    pub fn from_sqlx_error(error: &sqlx::Error, statement: &str) -> Self {
        if let Some(db_error) = error.as_database_error()
            && let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>()
        {
            let line_number = pg_error.position().map(|pos| {
                let position = match pos {
                    PgErrorPosition::Original(p) => p,
                    PgErrorPosition::Internal { position, .. } => position,
                };
                position_to_line(statement, position)
            });

            return Self {
                message: pg_error.message().to_string(),
                line_number,
                detail: pg_error.detail().map(str::to_string),
                hint: pg_error.hint().map(str::to_string),
                context: pg_error.r#where().map(str::to_string),
                code: Some(pg_error.code().to_string()),
            };
        }

        if let Some(db_error) = error.as_database_error() {
            return Self {
                message: db_error.message().to_string(),
                code: db_error.code().map(|c| c.into_owned()),
                ..Default::default()
            };
        }

        Self {
            message: error.to_string(),
            ..Default::default()
        }
    }

    /// Message with detail, hint and context appended
    pub fn full_message(&self) -> String {
        let mut msg = self.message.clone();
        if let Some(line) = self.line_number {
            msg.push_str(&format!(" (line {} of the statement)", line));
        }
        if let Some(detail) = &self.detail {
            msg.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            msg.push_str(&format!("\n  Hint: {}", hint));
        }
        if let Some(ctx) = &self.context {
            msg.push_str(&format!("\n  Context: {}", ctx));
        }
        msg
    }

    /// Failure of the `index`th (1-based) of `total` statements
    pub fn into_statement_failure(
        self,
        index: usize,
        total: usize,
        statement: &str,
    ) -> MigrationError {
        MigrationError::StatementFailed {
            index,
            total,
            statement: statement.to_string(),
            message: self.full_message(),
            code: self.code,
        }
    }
}

/// Line holding the 1-based character `position`
pub fn position_to_line(content: &str, position: usize) -> usize {
    content
        .chars()
        .take(position.saturating_sub(1))
        .filter(|c| *c == '\n')
        .count()
        + 1
}
