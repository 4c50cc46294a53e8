use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::diff::types::{SchemaComparison, SchemaDifference};
use crate::error::{PgShiftError, Result};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum MigrationType {
    #[default]
    Schema,
    Data,
    Full,
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MigrationType::Schema => "Schema",
            MigrationType::Data => "Data",
            MigrationType::Full => "Full",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    Draft,
    Ready,
    Executing,
    Completed,
    Failed,
    RolledBack,
}

impl MigrationStatus {
    pub fn can_transition_to(self, next: MigrationStatus) -> bool {
        use MigrationStatus::*;
        matches!(
            (self, next),
            (Draft, Ready)
                | (Ready, Executing)
                | (Executing, Completed)
                | (Executing, Failed)
                // resume from the failed statement
                | (Failed, Executing)
                | (Completed, RolledBack)
                | (Failed, RolledBack)
        )
    }
}

/// A generated forward script and its rollback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationScript {
    pub id: Uuid,
    pub comparison: SchemaComparison,
    pub selected_differences: Vec<SchemaDifference>,
    pub sql_script: String,
    pub rollback_script: String,
    pub migration_type: MigrationType,
    pub is_dry_run: bool,
    pub status: MigrationStatus,
    pub warnings: Vec<String>,
    /// Forward statements in execution order, each ending in `;`
    pub statements: Vec<String>,
    pub rollback_statements: Vec<String>,
    /// md5 of `sql_script`
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl MigrationScript {
    pub fn transition(&mut self, next: MigrationStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PgShiftError::Validation(format!(
                "Migration {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn has_data_loss(&self) -> bool {
        self.selected_differences.iter().any(|d| d.has_data_loss())
    }
}

pub fn checksum(sql: &str) -> String {
    format!("{:x}", md5::compute(sql.as_bytes()))
}

/// Header comments followed by statements separated by blank lines
pub fn render_script(
    title: &str,
    comparison: &SchemaComparison,
    warnings: &[String],
    statements: &[String],
) -> String {
    if statements.is_empty() {
        return "-- No changes detected\n".to_string();
    }

    let mut header = vec![
        format!("-- pgshift {}", title),
        format!(
            "-- Source: {} ({})",
            comparison.source.label, comparison.source.database
        ),
        format!(
            "-- Target: {} ({})",
            comparison.target.label, comparison.target.database
        ),
        format!("-- Comparison: {}", comparison.id),
        format!("-- Statements: {}", statements.len()),
    ];
    for warning in warnings {
        header.push(format!("-- WARNING: {}", warning.replace('\n', " ")));
    }

    format!("{}\n\n{}\n", header.join("\n"), statements.join("\n\n"))
}
