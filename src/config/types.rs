use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::db::pool::PoolConfig;
use crate::db::retry::RetryPolicy;
use crate::diff::types::{CompareOptions, ComparisonMode};

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub databases: Option<DatabasesInput>,
    pub comparison: Option<ComparisonInput>,
    pub pool: Option<PoolInput>,
    pub retry: Option<RetryInput>,
    pub output: Option<OutputInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub databases: Databases,
    pub comparison: Comparison,
    pub pool: Pool,
    pub retry: Retry,
    pub output: Output,
}

// Database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabasesInput {
    pub source_url: Option<String>,
    pub target_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Databases {
    pub source: Option<String>,
    pub target: Option<String>,
}

// Comparison configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ComparisonInput {
    pub mode: Option<ComparisonMode>,
    pub ignore_schemas: Option<Vec<String>>,
    pub include_system_objects: Option<bool>,
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub mode: ComparisonMode,
    pub ignore_schemas: Vec<String>,
    pub include_system_objects: bool,
    pub case_sensitive: bool,
}

impl Comparison {
    pub fn options(&self) -> CompareOptions {
        CompareOptions {
            ignore_schemas: self.ignore_schemas.clone(),
            include_system_objects: self.include_system_objects,
            case_sensitive: self.case_sensitive,
        }
    }
}

// Connection pool configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PoolInput {
    pub max_size: Option<usize>,
    pub acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub max_size: usize,
    pub acquire_timeout_ms: u64,
}

impl Pool {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_size: self.max_size,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
        }
    }
}

// Retry configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetryInput {
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Retry {
    pub max_attempts: u32,
}

impl Retry {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_attempts)
    }
}

// Output files
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputInput {
    pub migration_file: Option<String>,
    pub rollback_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub migration_file: String,
    pub rollback_file: String,
}

// CLI argument groups for command-specific options
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    #[arg(long, help = "Source database URL (the schema being migrated)")]
    pub source_url: Option<String>,

    #[arg(long, help = "Target database URL (the desired schema)")]
    pub target_url: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ComparisonArgs {
    #[arg(long, value_enum, help = "Comparison mode")]
    pub mode: Option<ComparisonMode>,

    #[arg(long, help = "Ignore these schemas (glob patterns)")]
    pub ignore_schemas: Option<Vec<String>>,

    #[arg(long, help = "Compare objects in pg_catalog and information_schema too")]
    pub include_system_objects: bool,

    #[arg(long, help = "Match object names case-sensitively")]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(long, help = "Where to write the migration script")]
    pub migration_file: Option<String>,

    #[arg(long, help = "Where to write the rollback script")]
    pub rollback_file: Option<String>,
}

// Conversion functions from CLI args to config input
impl From<DatabaseArgs> for DatabasesInput {
    fn from(args: DatabaseArgs) -> Self {
        Self {
            source_url: args.source_url,
            target_url: args.target_url,
        }
    }
}

impl From<ComparisonArgs> for ComparisonInput {
    fn from(args: ComparisonArgs) -> Self {
        Self {
            mode: args.mode,
            ignore_schemas: args.ignore_schemas,
            // Flags only ever switch a setting on
            include_system_objects: args.include_system_objects.then_some(true),
            case_sensitive: args.case_sensitive.then_some(true),
        }
    }
}

impl From<OutputArgs> for OutputInput {
    fn from(args: OutputArgs) -> Self {
        Self {
            migration_file: args.migration_file,
            rollback_file: args.rollback_file,
        }
    }
}
