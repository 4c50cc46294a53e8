//! pgshift apply - run a migration script against a database

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::db::{ConnectionInfo, MigrationExecutor, PgConnectionFactory, PgPool};
use crate::migration::split_statements;

#[derive(Debug, Clone, clap::Args)]
pub struct ApplyArgs {
    /// Script to run (defaults to the configured migration file)
    pub file: Option<PathBuf>,

    /// Database to migrate (defaults to the configured source URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Apply without asking, even when the script loses data
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Only validate the script; never connect
    #[arg(long)]
    pub dry_run: bool,
}

/// `-- WARNING:` lines of a generated script header
pub fn script_warnings(script: &str) -> Vec<String> {
    script
        .lines()
        .filter_map(|line| line.strip_prefix("-- WARNING:"))
        .map(|w| w.trim().to_string())
        .collect()
}

fn confirm_data_loss(warnings: &[String], yes: bool) -> Result<bool> {
    if warnings.is_empty() || yes {
        return Ok(true);
    }

    eprintln!("{}", style("This migration may lose data:").red().bold());
    for warning in warnings {
        eprintln!("  {} {}", style("!").red(), warning);
    }

    if !std::io::stdin().is_terminal() {
        bail!("Refusing to apply a script with data-loss warnings non-interactively; pass --yes");
    }

    Ok(Confirm::new()
        .with_prompt("Apply anyway?")
        .default(false)
        .interact()?)
}

/// Returns the number of statements executed
pub async fn cmd_apply(
    config: &Config,
    args: &ApplyArgs,
    cancel: &CancellationToken,
) -> Result<usize> {
    let file = args
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.migration_file));
    let script = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let statements = split_statements(&script)
        .with_context(|| format!("Failed to split {}", file.display()))?;
    if statements.is_empty() {
        eprintln!("No statements in {}", file.display());
        return Ok(0);
    }

    if args.dry_run {
        eprintln!(
            "Dry run: {} statements in {} validated, nothing executed",
            statements.len(),
            file.display()
        );
        return Ok(0);
    }

    if !confirm_data_loss(&script_warnings(&script), args.yes)? {
        eprintln!("Aborted");
        return Ok(0);
    }

    let url = args
        .url
        .as_deref()
        .or(config.databases.source.as_deref())
        .ok_or_else(|| anyhow!("No database given: pass --url or configure databases.source_url"))?;
    let connection = ConnectionInfo::from_url(url)?;
    info!("Applying {} to {}", file.display(), connection);

    let pool = PgPool::new(
        PgConnectionFactory::new(connection),
        config.pool.pool_config(),
    );
    let executor = MigrationExecutor::new(&pool, config.retry.policy());
    let result = executor.execute_sql(&script, cancel).await;
    pool.close().await;

    let executed = result.with_context(|| format!("Failed to apply {}", file.display()))?;
    eprintln!(
        "{} {} statements applied",
        style("Done:").green().bold(),
        executed
    );
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_warnings() {
        let script = "-- pgshift migration\n-- Statements: 1\n-- WARNING: table app.users: column \"email\" dropped\n\nALTER TABLE x;\n";
        assert_eq!(
            script_warnings(script),
            vec!["table app.users: column \"email\" dropped".to_string()]
        );
        assert!(script_warnings("SELECT 1;").is_empty());
    }

    #[test]
    fn test_confirmation_skipped_without_warnings_or_with_yes() {
        assert!(confirm_data_loss(&[], false).unwrap());
        assert!(confirm_data_loss(&["column dropped".to_string()], true).unwrap());
    }

    #[tokio::test]
    async fn test_dry_run_does_not_need_a_database() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("migration.sql");
        std::fs::write(&file, "CREATE SCHEMA app;\n\nDROP VIEW IF EXISTS \"app\".\"v\";\n").unwrap();

        let args = ApplyArgs {
            file: Some(file),
            url: None,
            yes: false,
            dry_run: true,
        };
        let executed = cmd_apply(&Config::default(), &args, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(executed, 0);
    }
}
