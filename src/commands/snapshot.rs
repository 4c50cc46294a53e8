//! pgshift snapshot - capture a live database into a snapshot file

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::catalog::extract::take_snapshot;
use crate::config::Config;
use crate::db::{ConnectionInfo, PoolRegistry};
use crate::snapshot::{Snapshot, load_snapshot, save_snapshot};

#[derive(Debug, Clone, clap::Args)]
pub struct SnapshotArgs {
    /// Database to capture (defaults to the configured source URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Output file; `.yaml`/`.yml` selects YAML, anything else JSON
    #[arg(long, short = 'o', default_value = "snapshot.json")]
    pub output: PathBuf,
}

/// Connect to `url` through `registry` and snapshot every supported object.
/// Pools stay open until the registry is closed.
pub async fn capture(
    url: &str,
    config: &Config,
    registry: &PoolRegistry,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    let info = ConnectionInfo::from_url(url)?;
    let pool = registry.get_or_create(&info);
    Ok(take_snapshot(&pool, &config.retry.policy(), cancel).await?)
}

/// Load one side of a comparison from a file, or capture it from a database
pub async fn resolve_side(
    side: &str,
    file: Option<&Path>,
    url: Option<&str>,
    config: &Config,
    registry: &PoolRegistry,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    match (file, url) {
        (Some(path), _) => {
            info!("Loading {} snapshot from {}", side, path.display());
            load_snapshot(path)
                .with_context(|| format!("Failed to load {} snapshot {}", side, path.display()))
        }
        (None, Some(url)) => {
            eprintln!("Capturing {} database...", side);
            capture(url, config, registry, cancel)
                .await
                .with_context(|| format!("Failed to capture {} database", side))
        }
        (None, None) => Err(anyhow!(
            "No {side} given: pass --{side} <file> or configure databases.{side}_url"
        )),
    }
}

pub async fn cmd_snapshot(
    config: &Config,
    args: &SnapshotArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let url = args
        .url
        .as_deref()
        .or(config.databases.source.as_deref())
        .ok_or_else(|| anyhow!("No database given: pass --url or configure databases.source_url"))?;

    let registry = PoolRegistry::new(config.pool.pool_config());
    let snapshot = capture(url, config, &registry, cancel).await;
    registry.close_all().await;

    let snapshot = snapshot?;
    save_snapshot(&snapshot, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    eprintln!(
        "Captured {} objects into {}",
        snapshot.objects.len(),
        args.output.display()
    );
    Ok(())
}
