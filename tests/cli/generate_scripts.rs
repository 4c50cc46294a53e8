use anyhow::Result;
use predicates::prelude::*;

use crate::helpers::cli::CliTestHelper;
use crate::helpers::fixtures::*;

#[test]
fn test_generate_prints_by_default() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args(["generate", "--source", "current.json", "--target", "desired.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-- pgshift migration"))
        .stdout(predicate::str::contains("-- pgshift rollback"))
        .stderr(predicate::str::contains("pass --write"));

    assert!(!helper.path("migration.sql").exists());
    Ok(())
}

#[test]
fn test_generate_writes_scripts() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args([
            "generate",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--write",
            "--migration-file",
            "out/up.sql",
            "--rollback-file",
            "out/down.sql",
            "--json",
            "out/migration.json",
        ])
        .assert()
        .success();

    let up = helper.read_file("out/up.sql")?;
    let down = helper.read_file("out/down.sql")?;
    assert!(up.contains("ALTER VIEW \"reports\".\"order_counts\" SET SCHEMA \"analytics\";"));
    assert!(down.contains("ALTER VIEW \"analytics\".\"order_counts\" SET SCHEMA \"reports\";"));
    assert!(down.contains("DROP VIEW IF EXISTS \"app\".\"user_orders\";"));

    let script: pgshift::migrate::MigrationScript =
        serde_json::from_str(&helper.read_file("out/migration.json")?)?;
    assert_eq!(script.sql_script, up);
    assert_eq!(script.checksum, format!("{:x}", md5::compute(up.as_bytes())));
    Ok(())
}

#[test]
fn test_generate_data_migration_is_rejected() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args([
            "generate",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--migration-type",
            "data",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
    Ok(())
}

#[test]
fn test_split_prints_numbered_statements() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_file(
        "script.sql",
        "CREATE FUNCTION app.f() RETURNS trigger AS $body$\nBEGIN\n  RETURN NEW;\nEND;\n$body$ LANGUAGE plpgsql;\n\n-- trailing comment\nDROP VIEW IF EXISTS \"app\".\"v\";\n",
    )?;

    helper
        .command()
        .args(["split", "script.sql"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-- [1/2]"))
        .stdout(predicate::str::contains("-- [2/2]"))
        .stderr(predicate::str::contains("2 statements"));
    Ok(())
}

#[test]
fn test_split_reports_unterminated_quote() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_file("broken.sql", "SELECT 1;\nSELECT $$ never closed;\n")?;

    helper
        .command()
        .args(["split", "broken.sql"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
    Ok(())
}

#[test]
fn test_apply_dry_run_never_connects() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args([
            "generate",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--write",
        ])
        .assert()
        .success();

    helper
        .command()
        .args(["apply", "--dry-run", "--url", "postgres://nobody@127.0.0.1:1/none"])
        .assert()
        .success()
        .stderr(predicate::str::contains("validated, nothing executed"));
    Ok(())
}

#[test]
fn test_apply_refuses_data_loss_without_yes() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_file(
        "migration.sql",
        "-- pgshift migration\n-- WARNING: table app.users: Column legacy dropped; its data is lost\n\nALTER TABLE \"app\".\"users\" DROP COLUMN IF EXISTS \"legacy\";\n",
    )?;

    helper
        .command()
        .args(["apply", "--url", "postgres://nobody@127.0.0.1:1/none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Column legacy dropped"))
        .stderr(predicate::str::contains("--yes"));
    Ok(())
}

#[test]
fn test_config_file_sets_output_and_mode() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_file(
        "pgshift.yaml",
        "comparison:\n  mode: lenient\noutput:\n  migration_file: scripts/forward.sql\n  rollback_file: scripts/backward.sql\n",
    )?;
    helper.write_snapshot("current.json", vec![view("app", "v", "SELECT 1", &[])])?;
    helper.write_snapshot(
        "desired.json",
        vec![
            view("app", "v", "select   1", &[]),
            sequence("app", "s"),
        ],
    )?;

    helper
        .command()
        .args(["generate", "--source", "current.json", "--target", "desired.json", "--write"])
        .assert()
        .success();

    // Lenient mode ignores the reformatted view; only the sequence is new
    let forward = helper.read_file("scripts/forward.sql")?;
    assert!(forward.contains("-- Statements: 1"));
    assert!(forward.contains("CREATE SEQUENCE"));
    assert!(helper.path("scripts/backward.sql").exists());
    Ok(())
}
