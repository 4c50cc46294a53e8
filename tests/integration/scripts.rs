//! Rendered migration scripts for realistic snapshot pairs.

use anyhow::Result;
use insta::assert_snapshot;
use pgshift::catalog::DatabaseObject;
use pgshift::diff::{CompareOptions, ComparisonMode, SchemaComparer};
use pgshift::diff::types::SchemaComparison;
use pgshift::migrate::{
    GenerateOptions, MigrationScript, MigrationScriptGenerator, MigrationStatus, MigrationType,
};
use pgshift::migration::split_statements;

use crate::helpers::fixtures::*;

fn comparison(source: Vec<DatabaseObject>, target: Vec<DatabaseObject>) -> SchemaComparison {
    SchemaComparer::new(ComparisonMode::Strict, CompareOptions::default())
        .compare_snapshots(&snapshot("current.json", source), &snapshot("desired.json", target))
}

fn generate(comparison: &SchemaComparison, options: &GenerateOptions) -> Result<MigrationScript> {
    Ok(MigrationScriptGenerator::new().generate(comparison, &comparison.differences, options)?)
}

/// Only objects that change in place or move
fn alter_only(desired: bool) -> Vec<DatabaseObject> {
    let keep = |o: &DatabaseObject| {
        matches!(
            o,
            DatabaseObject::Role(_)
                | DatabaseObject::Tablespace(_)
                | DatabaseObject::Extension(_)
                | DatabaseObject::Table(_)
                | DatabaseObject::View(_)
        ) && o.name() != "orders"
            && o.name() != "active_users"
            && o.name() != "user_orders"
    };
    let objects = if desired {
        desired_schema()
    } else {
        current_schema()
    };
    objects.into_iter().filter(keep).collect()
}

#[test]
fn test_in_place_changes() -> Result<()> {
    let comparison = comparison(alter_only(false), alter_only(true));
    let script = generate(&comparison, &GenerateOptions::default())?;

    assert_snapshot!(script.statements.join("\n"), @r#"
    ALTER ROLE "reporting" WITH NOSUPERUSER NOCREATEDB NOCREATEROLE LOGIN;
    ALTER TABLESPACE "fast" OWNER TO "admin";
    ALTER EXTENSION "pgcrypto" UPDATE TO '1.3';
    ALTER TABLE "app"."users" ADD COLUMN created_at timestamp with time zone DEFAULT now();
    ALTER TABLE "app"."users" ALTER COLUMN "id" TYPE bigint USING "id"::bigint;
    ALTER TABLE "app"."users" ALTER COLUMN "email" SET DEFAULT ''::character varying;
    ALTER TABLE "app"."users" ALTER COLUMN "email" SET NOT NULL;
    ALTER VIEW "reports"."order_counts" SET SCHEMA "analytics";
    "#);

    assert_snapshot!(script.rollback_statements.join("\n"), @r#"
    ALTER ROLE "reporting" WITH NOSUPERUSER NOCREATEDB NOCREATEROLE NOLOGIN;
    ALTER TABLESPACE "fast" OWNER TO "postgres";
    ALTER EXTENSION "pgcrypto" UPDATE TO '1.2';
    ALTER TABLE "app"."users" DROP COLUMN IF EXISTS "created_at";
    ALTER TABLE "app"."users" ALTER COLUMN "id" TYPE integer USING "id"::integer;
    ALTER TABLE "app"."users" ALTER COLUMN "email" DROP DEFAULT;
    ALTER TABLE "app"."users" ALTER COLUMN "email" DROP NOT NULL;
    ALTER VIEW "analytics"."order_counts" SET SCHEMA "reports";
    "#);

    assert!(!script.has_data_loss());
    Ok(())
}

#[test]
fn test_script_header_and_splitting() -> Result<()> {
    let comparison = comparison(vec![extension("pgcrypto", Some("1.2"))], desired_schema());
    let script = generate(&comparison, &GenerateOptions::default())?;

    assert!(script.sql_script.starts_with("-- pgshift migration\n"));
    assert!(script.sql_script.contains("-- Source: current.json (app)"));
    assert!(script.sql_script.contains("-- Target: desired.json (app)"));
    assert!(
        script
            .sql_script
            .contains(&format!("-- Statements: {}", script.statements.len()))
    );

    // The trigger function body has semicolons inside its dollar quote
    assert_eq!(
        split_statements(&script.sql_script)?.len(),
        script.statements.len()
    );
    assert_eq!(
        split_statements(&script.rollback_script)?.len(),
        script.rollback_statements.len()
    );
    assert_eq!(script.status, MigrationStatus::Ready);
    Ok(())
}

#[test]
fn test_dropped_column_is_flagged() -> Result<()> {
    let source = vec![table(
        "app",
        "users",
        vec![column("id", "integer", false), column("legacy", "text", true)],
    )];
    let target = vec![table("app", "users", vec![column("id", "integer", false)])];
    let script = generate(&comparison(source, target), &GenerateOptions::default())?;

    assert!(script.has_data_loss());
    assert_eq!(
        script.statements,
        vec!["ALTER TABLE \"app\".\"users\" DROP COLUMN IF EXISTS \"legacy\";"]
    );
    assert!(
        script
            .sql_script
            .lines()
            .any(|l| l.starts_with("-- WARNING: table app.users: Column legacy dropped"))
    );
    assert_eq!(
        script.rollback_statements,
        vec!["ALTER TABLE \"app\".\"users\" ADD COLUMN legacy text;"]
    );
    Ok(())
}

#[test]
fn test_required_column_without_default_is_flagged() -> Result<()> {
    let source = vec![table("app", "users", vec![column("id", "integer", false)])];
    let target = vec![table(
        "app",
        "users",
        vec![column("id", "integer", false), column("tenant_id", "integer", false)],
    )];
    let script = generate(&comparison(source, target), &GenerateOptions::default())?;

    assert_eq!(
        script.statements,
        vec!["ALTER TABLE \"app\".\"users\" ADD COLUMN tenant_id integer NOT NULL;"]
    );
    assert!(script.has_data_loss());
    assert_eq!(script.warnings.len(), 1);
    assert!(
        script
            .sql_script
            .lines()
            .any(|l| l.starts_with("-- WARNING: table app.users: Column tenant_id integer added as NOT NULL"))
    );
    Ok(())
}

#[test]
fn test_full_migrations_only_generate_schema_changes() -> Result<()> {
    let comparison = comparison(vec![], vec![sequence("app", "invoice_number_seq")]);
    let script = generate(
        &comparison,
        &GenerateOptions {
            migration_type: MigrationType::Full,
            dry_run: true,
        },
    )?;

    assert_eq!(script.statements.len(), 1);
    assert!(script.warnings.iter().any(|w| w.contains("Data migration")));
    assert_eq!(script.status, MigrationStatus::Draft);
    Ok(())
}

#[test]
fn test_identical_snapshots_produce_empty_script() -> Result<()> {
    let comparison = comparison(current_schema(), current_schema());
    let script = generate(&comparison, &GenerateOptions::default())?;

    assert!(script.is_empty());
    assert_eq!(script.sql_script, "-- No changes detected\n");
    Ok(())
}
