//! pgshift diff - compare two schema snapshots
//!
//! Each side comes from a snapshot file or, when no file is given, from the
//! configured database URL.

use anyhow::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::config::{ComparisonArgs, Config, DatabaseArgs};
use crate::db::PoolRegistry;
use crate::diff::SchemaComparer;
use crate::diff::types::SchemaComparison;

use super::diff_output::{DiffFormat, format_comparison};
use super::snapshot::resolve_side;

#[derive(Debug, Clone, clap::Args)]
pub struct DiffArgs {
    /// Snapshot of the schema being migrated
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Snapshot of the desired schema
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "detailed")]
    pub format: DiffFormat,

    #[command(flatten)]
    pub database_args: DatabaseArgs,

    #[command(flatten)]
    pub comparison_args: ComparisonArgs,
}

/// Resolve both sides and compare them with the configured options.
/// Sides captured from the same database share one pool.
pub async fn compare(
    config: &Config,
    source: Option<&std::path::Path>,
    target: Option<&std::path::Path>,
    cancel: &CancellationToken,
) -> Result<SchemaComparison> {
    let registry = PoolRegistry::new(config.pool.pool_config());
    let sides = async {
        let source = resolve_side(
            "source",
            source,
            config.databases.source.as_deref(),
            config,
            &registry,
            cancel,
        )
        .await?;
        let target = resolve_side(
            "target",
            target,
            config.databases.target.as_deref(),
            config,
            &registry,
            cancel,
        )
        .await?;
        anyhow::Ok((source, target))
    }
    .await;
    registry.close_all().await;
    let (source, target) = sides?;

    let comparer = SchemaComparer::new(config.comparison.mode, config.comparison.options());
    Ok(comparer.compare_snapshots(&source, &target))
}

/// Print the differences; returns whether any were found
pub async fn cmd_diff(config: &Config, args: &DiffArgs, cancel: &CancellationToken) -> Result<bool> {
    let comparison = compare(
        config,
        args.source.as_deref(),
        args.target.as_deref(),
        cancel,
    )
    .await?;

    println!("{}", format_comparison(&comparison, args.format)?);
    Ok(!comparison.is_identical())
}
