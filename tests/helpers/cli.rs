use anyhow::Result;
use assert_cmd::Command;
use pgshift::catalog::DatabaseObject;
use pgshift::constants::{SOURCE_URL_ENV, TARGET_URL_ENV};
use pgshift::snapshot::save_snapshot;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use super::fixtures::snapshot;

/// Runs the pgshift binary inside a scratch directory
pub struct CliTestHelper {
    pub temp_dir: TempDir,
}

impl CliTestHelper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Command for the binary with database URLs from the environment cleared
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pgshift").expect("pgshift binary is built");
        cmd.current_dir(self.temp_dir.path())
            .env_remove(SOURCE_URL_ENV)
            .env_remove(TARGET_URL_ENV)
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_snapshot(&self, name: &str, objects: Vec<DatabaseObject>) -> Result<PathBuf> {
        let path = self.path(name);
        save_snapshot(&snapshot(name, objects), &path)?;
        Ok(path)
    }

    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read_file(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.path(name))?)
    }
}
