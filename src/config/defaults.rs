use crate::config::types::*;
use crate::constants::{
    DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_MIGRATION_FILE, DEFAULT_POOL_SIZE, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_ROLLBACK_FILE,
};
use crate::diff::types::ComparisonMode;

// Config and Databases derive Default

impl Default for Comparison {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Strict,
            ignore_schemas: vec!["pg_*".to_string(), "information_schema".to_string()],
            include_system_objects: false,
            case_sensitive: false,
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            migration_file: DEFAULT_MIGRATION_FILE.to_string(),
            rollback_file: DEFAULT_ROLLBACK_FILE.to_string(),
        }
    }
}
