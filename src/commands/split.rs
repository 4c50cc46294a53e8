//! pgshift split - show how a script is divided into statements

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use crate::migration::split_statements;

pub fn cmd_split(file: &Path) -> Result<Vec<String>> {
    let script = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let statements = split_statements(&script)
        .with_context(|| format!("Failed to split {}", file.display()))?;

    for (i, statement) in statements.iter().enumerate() {
        println!("{}", style(format!("-- [{}/{}]", i + 1, statements.len())).dim());
        println!("{}\n", statement);
    }
    eprintln!("{} statements", statements.len());

    Ok(statements)
}
