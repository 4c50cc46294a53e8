use anyhow::Result;
use predicates::prelude::*;

use crate::helpers::cli::CliTestHelper;
use crate::helpers::fixtures::*;

#[test]
fn test_diff_identical_snapshots() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("copy.json", current_schema())?;

    helper
        .command()
        .args(["diff", "--source", "current.json", "--target", "copy.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences found"));
    Ok(())
}

#[test]
fn test_diff_exits_one_when_schemas_differ() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args(["diff", "--source", "current.json", "--target", "desired.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("view app.active_users [added]"))
        .stdout(predicate::str::contains("view analytics.order_counts [moved]"))
        .stdout(predicate::str::contains("Column id type changes from integer to bigint"));
    Ok(())
}

#[test]
fn test_diff_summary_format() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    helper
        .command()
        .args([
            "diff",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--format",
            "summary",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("added"))
        .stdout(predicate::str::contains("[added]").not());
    Ok(())
}

#[test]
fn test_diff_json_format_parses() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;
    helper.write_snapshot("desired.json", desired_schema())?;

    let output = helper
        .command()
        .args([
            "diff",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--format",
            "json",
        ])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let comparison: pgshift::diff::SchemaComparison = serde_json::from_slice(&output.stdout)?;
    assert!(!comparison.differences.is_empty());
    assert_eq!(comparison.source.label, "current.json");
    Ok(())
}

#[test]
fn test_diff_ignored_schemas() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot(
        "current.json",
        vec![view("reports", "daily", "SELECT 1", &[])],
    )?;
    helper.write_snapshot("desired.json", vec![])?;

    helper
        .command()
        .args([
            "diff",
            "--source",
            "current.json",
            "--target",
            "desired.json",
            "--ignore-schemas",
            "rep*",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences found"));
    Ok(())
}

#[test]
fn test_diff_without_target_explains() -> Result<()> {
    let helper = CliTestHelper::new()?;
    helper.write_snapshot("current.json", current_schema())?;

    helper
        .command()
        .args(["diff", "--source", "current.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target <file>"));
    Ok(())
}
