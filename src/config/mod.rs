pub mod builder;
pub mod defaults;
pub mod filter;
pub mod merge;
pub mod types;

#[cfg(test)]
mod tests;

pub use builder::ConfigBuilder;
pub use filter::ObjectFilter;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Read the YAML config file; a missing file yields an empty input
pub fn load_config(config_file: &str) -> Result<ConfigInput> {
    let path = Path::new(config_file);
    if !path.exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", config_file))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", config_file))
}
