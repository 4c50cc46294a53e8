pub mod apply;
pub mod diff;
pub mod diff_output;
pub mod generate;
pub mod snapshot;
pub mod split;

// Re-export all command functions
pub use apply::{ApplyArgs, cmd_apply};
pub use diff::{DiffArgs, cmd_diff};
pub use diff_output::DiffFormat;
pub use generate::{GenerateArgs, cmd_generate};
pub use snapshot::{SnapshotArgs, cmd_snapshot};
pub use split::cmd_split;
