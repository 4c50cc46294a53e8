//! Schema snapshots stored as JSON or YAML files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::catalog::DatabaseObject;
use crate::diff::types::SnapshotInfo;
use crate::error::{PgShiftError, Result};

/// Objects of one database at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// File path or masked connection string the objects came from
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    pub objects: Vec<DatabaseObject>,
}

/// Snapshot files are either a full [`Snapshot`] or a bare object list
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Full(Snapshot),
    Objects(Vec<DatabaseObject>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// `.yaml` and `.yml` are YAML, everything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SnapshotFormat::Yaml
            }
            _ => SnapshotFormat::Json,
        }
    }
}

impl Snapshot {
    pub fn new(source: impl Into<String>, objects: Vec<DatabaseObject>) -> Self {
        Self {
            source: source.into(),
            captured_at: Some(Utc::now()),
            objects,
        }
    }

    /// Database the objects belong to, taken from the first object
    pub fn database(&self) -> &str {
        self.objects
            .first()
            .map(|o| o.identity().database.as_str())
            .unwrap_or_default()
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            label: self.source.clone(),
            database: self.database().to_string(),
            object_count: self.objects.len(),
        }
    }

    pub fn parse(content: &str, format: SnapshotFormat) -> Result<Self> {
        let file: SnapshotFile = match format {
            SnapshotFormat::Json => serde_json::from_str(content)?,
            SnapshotFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(match file {
            SnapshotFile::Full(snapshot) => snapshot,
            SnapshotFile::Objects(objects) => Snapshot {
                source: String::new(),
                captured_at: None,
                objects,
            },
        })
    }

    pub fn render(&self, format: SnapshotFormat) -> Result<String> {
        Ok(match format {
            SnapshotFormat::Json => serde_json::to_string_pretty(self)?,
            SnapshotFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    info!("Loading snapshot from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        PgShiftError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read snapshot {}: {}", path.display(), e),
        ))
    })?;

    let mut snapshot = Snapshot::parse(&content, SnapshotFormat::from_path(path))?;
    if snapshot.source.is_empty() {
        snapshot.source = path.display().to_string();
    }
    Ok(snapshot)
}

pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let content = snapshot.render(SnapshotFormat::from_path(path))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!(
        "Saved {} objects to {}",
        snapshot.objects.len(),
        path.display()
    );
    Ok(())
}
