//! Runs migration scripts inside a single transaction.

use sqlx::Connection;
use sqlx::postgres::PgConnection;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::db::error_context::SqlErrorContext;
use crate::db::pool::PgPool;
use crate::db::retry::{RetryPolicy, retry_with_policy};
use crate::error::{PgShiftError, Result};
use crate::migrate::script::{MigrationScript, MigrationStatus};
use crate::migration::split_statements;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub statements: usize,
    pub dry_run: bool,
    pub duration: Duration,
}

/// Execute `statements` in one transaction; any failure rolls all of them back
async fn run_in_transaction(
    conn: &mut PgConnection,
    statements: &[String],
    cancel: &CancellationToken,
) -> Result<()> {
    let total = statements.len();
    let mut tx = conn.begin().await?;

    for (i, statement) in statements.iter().enumerate() {
        let index = i + 1;
        debug!("Executing statement {}/{}", index, total);

        let result = tokio::select! {
            _ = cancel.cancelled() => None,
            result = sqlx::raw_sql(statement).execute(&mut *tx) => Some(result),
        };

        match result {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                let context = SqlErrorContext::from_sqlx_error(&e, statement);
                error!(
                    code = context.code.as_deref().unwrap_or_default(),
                    "Statement {}/{} failed: {}", index, total, context.message
                );
                // Dropping the transaction rolls it back
                return Err(context.into_statement_failure(index, total, statement).into());
            }
            None => {
                info!("Cancelled before statement {}/{}; rolling back", index, total);
                return Err(PgShiftError::Cancelled);
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

pub struct MigrationExecutor<'a> {
    pool: &'a PgPool,
    policy: RetryPolicy,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(pool: &'a PgPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    /// Check that the script text splits into exactly its recorded statements
    pub fn validate(script: &MigrationScript) -> Result<usize> {
        let split = split_statements(&script.sql_script)?;
        if split.len() != script.statements.len() {
            return Err(PgShiftError::Validation(format!(
                "Script splits into {} statements but {} were generated",
                split.len(),
                script.statements.len()
            )));
        }
        split_statements(&script.rollback_script)?;
        Ok(split.len())
    }

    /// Split `sql` and run its statements in one transaction, retrying the
    /// whole transaction on transient failures
    pub async fn execute_sql(&self, sql: &str, cancel: &CancellationToken) -> Result<usize> {
        let statements = split_statements(sql)?;
        self.run(&statements, cancel).await?;
        Ok(statements.len())
    }

    async fn run(&self, statements: &[String], cancel: &CancellationToken) -> Result<()> {
        if statements.is_empty() {
            info!("Nothing to execute");
            return Ok(());
        }

        let pool = self.pool;
        retry_with_policy("execute migration", &self.policy, cancel, || async move {
            let mut conn = pool.acquire(cancel).await?;
            let result = run_in_transaction(&mut conn, statements, cancel).await;
            pool.release(conn).await;
            result
        })
        .await
    }

    /// Apply the forward script. A dry run only validates and never touches
    /// the database.
    pub async fn execute(
        &self,
        script: &mut MigrationScript,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport> {
        let started = Instant::now();
        let statements = Self::validate(script)?;

        if script.is_dry_run {
            info!("Dry run: {} statements validated, nothing executed", statements);
            return Ok(ExecutionReport {
                statements,
                dry_run: true,
                duration: started.elapsed(),
            });
        }

        if script.status == MigrationStatus::Draft {
            script.transition(MigrationStatus::Ready)?;
        }
        script.transition(MigrationStatus::Executing)?;
        info!(
            "Applying migration {} ({} statements, checksum {})",
            script.id, statements, script.checksum
        );

        let forward = script.statements.clone();
        match self.run(&forward, cancel).await {
            Ok(()) => {
                script.transition(MigrationStatus::Completed)?;
                info!("Migration {} completed", script.id);
                Ok(ExecutionReport {
                    statements,
                    dry_run: false,
                    duration: started.elapsed(),
                })
            }
            Err(e) => {
                script.transition(MigrationStatus::Failed)?;
                Err(e)
            }
        }
    }

    /// Apply the rollback script of a completed or failed migration
    pub async fn rollback(
        &self,
        script: &mut MigrationScript,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport> {
        if !script.status.can_transition_to(MigrationStatus::RolledBack) {
            return Err(PgShiftError::Validation(format!(
                "Migration {} is {:?} and cannot be rolled back",
                script.id, script.status
            )));
        }

        let started = Instant::now();
        info!("Rolling back migration {}", script.id);
        let statements = script.rollback_statements.clone();
        self.run(&statements, cancel).await?;
        script.transition(MigrationStatus::RolledBack)?;

        Ok(ExecutionReport {
            statements: statements.len(),
            dry_run: false,
            duration: started.elapsed(),
        })
    }
}
