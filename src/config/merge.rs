use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

fn merge_sections<T>(a: Option<T>, b: Option<T>, merge_with: impl FnOnce(T, T) -> T) -> Option<T> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(merge_with(a, b)),
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            databases: merge_sections(self.databases, other.databases, DatabasesInput::merge_with),
            comparison: merge_sections(
                self.comparison,
                other.comparison,
                ComparisonInput::merge_with,
            ),
            pool: merge_sections(self.pool, other.pool, PoolInput::merge_with),
            retry: self.retry.merge(other.retry),
            output: merge_sections(self.output, other.output, OutputInput::merge_with),
        }
    }
}

// Field-wise merges: `other` wins wherever it is set
impl DatabasesInput {
    pub fn merge_with(self, other: DatabasesInput) -> DatabasesInput {
        DatabasesInput {
            source_url: other.source_url.or(self.source_url),
            target_url: other.target_url.or(self.target_url),
        }
    }
}

impl ComparisonInput {
    pub fn merge_with(self, other: ComparisonInput) -> ComparisonInput {
        ComparisonInput {
            mode: other.mode.or(self.mode),
            ignore_schemas: other.ignore_schemas.or(self.ignore_schemas),
            include_system_objects: other.include_system_objects.or(self.include_system_objects),
            case_sensitive: other.case_sensitive.or(self.case_sensitive),
        }
    }
}

impl PoolInput {
    pub fn merge_with(self, other: PoolInput) -> PoolInput {
        PoolInput {
            max_size: other.max_size.or(self.max_size),
            acquire_timeout_ms: other.acquire_timeout_ms.or(self.acquire_timeout_ms),
        }
    }
}

impl OutputInput {
    pub fn merge_with(self, other: OutputInput) -> OutputInput {
        OutputInput {
            migration_file: other.migration_file.or(self.migration_file),
            rollback_file: other.rollback_file.or(self.rollback_file),
        }
    }
}
