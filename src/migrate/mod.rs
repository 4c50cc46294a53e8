//! Migration script generation from schema comparisons.

pub mod generation;
pub mod script;

pub use generation::{GenerateOptions, MigrationPlan, MigrationScriptGenerator};
pub use script::{MigrationScript, MigrationStatus, MigrationType};
