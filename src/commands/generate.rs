//! pgshift generate - build the migration and rollback scripts

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::config::{ComparisonArgs, Config, DatabaseArgs, OutputArgs};
use crate::migrate::{GenerateOptions, MigrationScript, MigrationScriptGenerator, MigrationType};

use super::diff::compare;

#[derive(Debug, Clone, clap::Args)]
pub struct GenerateArgs {
    /// Snapshot of the schema being migrated
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Snapshot of the desired schema
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Write the scripts to the output files instead of printing them
    #[arg(long = "write", action = clap::ArgAction::SetFalse)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value = "schema")]
    pub migration_type: MigrationType,

    /// Also write the full migration (comparison, statements, checksum) as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    #[command(flatten)]
    pub database_args: DatabaseArgs,

    #[command(flatten)]
    pub comparison_args: ComparisonArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn cmd_generate(
    config: &Config,
    args: &GenerateArgs,
    cancel: &CancellationToken,
) -> Result<MigrationScript> {
    let comparison = compare(
        config,
        args.source.as_deref(),
        args.target.as_deref(),
        cancel,
    )
    .await?;

    let options = GenerateOptions {
        migration_type: args.migration_type,
        dry_run: args.dry_run,
    };
    let script = MigrationScriptGenerator::new()
        .generate(&comparison, &comparison.differences, &options)
        .context("Failed to generate migration")?;

    for warning in &script.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    if args.dry_run {
        println!("{}", script.sql_script);
        println!("-- Rollback\n");
        println!("{}", script.rollback_script);
        eprintln!(
            "{}",
            style("Dry run: nothing written (pass --write to save the scripts)").dim()
        );
    } else {
        let migration_file = Path::new(&config.output.migration_file);
        let rollback_file = Path::new(&config.output.rollback_file);
        write_file(migration_file, &script.sql_script)?;
        write_file(rollback_file, &script.rollback_script)?;
        eprintln!(
            "Wrote {} statements to {} and {} to {}",
            script.statements.len(),
            migration_file.display(),
            script.rollback_statements.len(),
            rollback_file.display()
        );
    }

    if let Some(path) = &args.json {
        write_file(path, &serde_json::to_string_pretty(&script)?)?;
    }

    Ok(script)
}
