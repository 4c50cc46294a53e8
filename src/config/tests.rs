use super::*;
use crate::config::merge::Merge;
use crate::diff::types::ComparisonMode;
use std::time::Duration;

#[test]
fn test_config_input_merge() {
    let file_config = ConfigInput {
        databases: Some(DatabasesInput {
            source_url: Some("postgres://localhost/dev".to_string()),
            target_url: Some("postgres://localhost/staging".to_string()),
        }),
        comparison: Some(ComparisonInput {
            mode: Some(ComparisonMode::Lenient),
            ignore_schemas: Some(vec!["audit".to_string()]),
            include_system_objects: None,
            case_sensitive: Some(true),
        }),
        pool: Some(PoolInput {
            max_size: Some(4),
            acquire_timeout_ms: None,
        }),
        retry: None,
        output: None,
    };

    let cli_config = ConfigInput {
        databases: Some(DatabasesInput {
            source_url: None, // CLI doesn't override this
            target_url: Some("postgres://localhost/prod".to_string()),
        }),
        comparison: Some(ComparisonInput {
            mode: Some(ComparisonMode::Strict),
            ..Default::default()
        }),
        pool: None,
        retry: Some(RetryInput {
            max_attempts: Some(5),
        }),
        output: Some(OutputInput {
            migration_file: Some("out/up.sql".to_string()),
            rollback_file: None,
        }),
    };

    let merged = file_config.merge(cli_config);

    let databases = merged.databases.as_ref().unwrap();
    assert_eq!(databases.source_url.as_deref(), Some("postgres://localhost/dev"));
    assert_eq!(databases.target_url.as_deref(), Some("postgres://localhost/prod"));

    // CLI wins field by field, file values survive elsewhere
    let comparison = merged.comparison.as_ref().unwrap();
    assert_eq!(comparison.mode, Some(ComparisonMode::Strict));
    assert_eq!(comparison.ignore_schemas, Some(vec!["audit".to_string()]));
    assert_eq!(comparison.case_sensitive, Some(true));

    assert_eq!(merged.pool.as_ref().unwrap().max_size, Some(4));
    assert_eq!(merged.retry.as_ref().unwrap().max_attempts, Some(5));
    assert_eq!(
        merged.output.as_ref().unwrap().migration_file.as_deref(),
        Some("out/up.sql")
    );
}

#[test]
fn test_config_builder_defaults() {
    let config = ConfigBuilder::new().resolve().unwrap();

    assert_eq!(config.comparison.mode, ComparisonMode::Strict);
    assert_eq!(
        config.comparison.ignore_schemas,
        vec!["pg_*".to_string(), "information_schema".to_string()]
    );
    assert!(!config.comparison.include_system_objects);
    assert!(!config.comparison.case_sensitive);

    assert_eq!(config.pool.max_size, 10);
    assert_eq!(
        config.pool.pool_config().acquire_timeout,
        Duration::from_secs(30)
    );
    assert_eq!(config.retry.policy().max_attempts, 3);

    assert_eq!(config.output.migration_file, "migration.sql");
    assert_eq!(config.output.rollback_file, "rollback.sql");
}

#[test]
fn test_config_builder_cli_overrides_file() {
    let file: ConfigInput = serde_yaml::from_str(
        r#"
databases:
  source_url: postgres://localhost/dev
comparison:
  mode: lenient
  ignore_schemas: ["staging_*"]
pool:
  max_size: 2
  acquire_timeout_ms: 500
output:
  rollback_file: down.sql
"#,
    )
    .unwrap();

    let cli = ConfigInput {
        databases: Some(
            DatabaseArgs {
                source_url: None,
                target_url: Some("postgres://localhost/prod".to_string()),
            }
            .into(),
        ),
        comparison: Some(
            ComparisonArgs {
                case_sensitive: true,
                ..Default::default()
            }
            .into(),
        ),
        ..Default::default()
    };

    let config = ConfigBuilder::new()
        .with_file(file)
        .with_cli_args(cli)
        .resolve()
        .unwrap();

    assert_eq!(
        config.databases.source.as_deref(),
        Some("postgres://localhost/dev")
    );
    assert_eq!(
        config.databases.target.as_deref(),
        Some("postgres://localhost/prod")
    );
    assert_eq!(config.comparison.mode, ComparisonMode::Lenient);
    assert_eq!(config.comparison.ignore_schemas, vec!["staging_*".to_string()]);
    assert!(config.comparison.case_sensitive);
    assert!(config.comparison.options().case_sensitive);

    assert_eq!(config.pool.max_size, 2);
    assert_eq!(
        config.pool.pool_config().acquire_timeout,
        Duration::from_millis(500)
    );
    assert_eq!(config.output.migration_file, "migration.sql");
    assert_eq!(config.output.rollback_file, "down.sql");
}

#[test]
fn test_unset_cli_flags_do_not_override_file() {
    let cli: ComparisonInput = ComparisonArgs::default().into();
    assert_eq!(cli.include_system_objects, None);
    assert_eq!(cli.case_sensitive, None);
}

#[test]
fn test_invalid_values_are_rejected() {
    let zero_pool = ConfigInput {
        pool: Some(PoolInput {
            max_size: Some(0),
            acquire_timeout_ms: None,
        }),
        ..Default::default()
    };
    assert!(ConfigBuilder::new().with_file(zero_pool).resolve().is_err());

    let zero_retries = ConfigInput {
        retry: Some(RetryInput {
            max_attempts: Some(0),
        }),
        ..Default::default()
    };
    assert!(ConfigBuilder::new().with_file(zero_retries).resolve().is_err());

    let bad_pattern = ConfigInput {
        comparison: Some(ComparisonInput {
            ignore_schemas: Some(vec!["[".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = ConfigBuilder::new()
        .with_file(bad_pattern)
        .resolve()
        .unwrap_err();
    assert!(err.to_string().contains("ignore_schemas"));
}

#[test]
fn test_load_config_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pgshift.yaml");
    let input = load_config(path.to_str().unwrap()).unwrap();
    assert!(input.databases.is_none());
    assert!(input.comparison.is_none());
}

#[test]
fn test_load_config_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pgshift.yaml");
    std::fs::write(&path, "comparison:\n  mode: fuzzy\n").unwrap();
    let err = load_config(path.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
