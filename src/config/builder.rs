use crate::config::{merge::Merge, types::*};
use crate::constants::{SOURCE_URL_ENV, TARGET_URL_ENV};
use anyhow::{Result, anyhow};

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            databases: self.resolve_databases(),
            comparison: self.resolve_comparison(&defaults.comparison)?,
            pool: self.resolve_pool(&defaults.pool)?,
            retry: self.resolve_retry(&defaults.retry)?,
            output: self.resolve_output(&defaults.output),
        })
    }

    fn resolve_databases(&self) -> Databases {
        let db_input = self.config_input.databases.as_ref();

        let source = db_input
            .and_then(|d| d.source_url.as_ref())
            .cloned()
            .or_else(|| std::env::var(SOURCE_URL_ENV).ok());

        let target = db_input
            .and_then(|d| d.target_url.as_ref())
            .cloned()
            .or_else(|| std::env::var(TARGET_URL_ENV).ok());

        Databases { source, target }
    }

    fn resolve_comparison(&self, defaults: &Comparison) -> Result<Comparison> {
        let input = self.config_input.comparison.as_ref();

        let ignore_schemas = input
            .and_then(|c| c.ignore_schemas.as_ref())
            .cloned()
            .unwrap_or_else(|| defaults.ignore_schemas.clone());

        for pattern in &ignore_schemas {
            glob::Pattern::new(pattern)
                .map_err(|e| anyhow!("Invalid ignore_schemas pattern '{}': {}", pattern, e))?;
        }

        Ok(Comparison {
            mode: input.and_then(|c| c.mode).unwrap_or(defaults.mode),
            ignore_schemas,
            include_system_objects: input
                .and_then(|c| c.include_system_objects)
                .unwrap_or(defaults.include_system_objects),
            case_sensitive: input
                .and_then(|c| c.case_sensitive)
                .unwrap_or(defaults.case_sensitive),
        })
    }

    fn resolve_pool(&self, defaults: &Pool) -> Result<Pool> {
        let input = self.config_input.pool.as_ref();

        let max_size = input
            .and_then(|p| p.max_size)
            .unwrap_or(defaults.max_size);
        if max_size == 0 {
            return Err(anyhow!("pool.max_size must be at least 1"));
        }

        Ok(Pool {
            max_size,
            acquire_timeout_ms: input
                .and_then(|p| p.acquire_timeout_ms)
                .unwrap_or(defaults.acquire_timeout_ms),
        })
    }

    fn resolve_retry(&self, defaults: &Retry) -> Result<Retry> {
        let max_attempts = self
            .config_input
            .retry
            .as_ref()
            .and_then(|r| r.max_attempts)
            .unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }

        Ok(Retry { max_attempts })
    }

    fn resolve_output(&self, defaults: &Output) -> Output {
        let input = self.config_input.output.as_ref();

        Output {
            migration_file: input
                .and_then(|o| o.migration_file.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.migration_file.clone()),
            rollback_file: input
                .and_then(|o| o.rollback_file.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.rollback_file.clone()),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
