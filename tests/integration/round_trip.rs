//! Generated plans applied to in-memory schemas must reach the other side
//! exactly, and their rollbacks must come back.

use anyhow::Result;
use pgshift::catalog::DatabaseObject;
use pgshift::diff::operations::{MigrationStep, SqlRenderer};
use pgshift::diff::{CompareOptions, ComparisonMode, DiffType, SchemaComparer, SchemaDifference};
use pgshift::migrate::{MigrationPlan, MigrationScriptGenerator};
use rstest::rstest;

use crate::helpers::applier::InMemoryApplier;
use crate::helpers::fixtures::*;

fn compare(source: &[DatabaseObject], target: &[DatabaseObject]) -> Vec<SchemaDifference> {
    SchemaComparer::new(ComparisonMode::Strict, CompareOptions::default()).compare(source, target)
}

fn plan(source: &[DatabaseObject], target: &[DatabaseObject]) -> Result<MigrationPlan> {
    let differences = compare(source, target);
    Ok(MigrationScriptGenerator::new().plan(&differences)?)
}

fn known(source: &[DatabaseObject], target: &[DatabaseObject]) -> Vec<DatabaseObject> {
    source.iter().chain(target).cloned().collect()
}

fn apply(
    start: &[DatabaseObject],
    steps: &[MigrationStep],
    known: &[DatabaseObject],
) -> Result<Vec<DatabaseObject>> {
    let mut applier = InMemoryApplier::new(start.to_vec(), known.to_vec());
    applier.apply_all(steps)?;
    Ok(applier.objects)
}

fn describe(differences: &[SchemaDifference]) -> Vec<String> {
    differences
        .iter()
        .map(|d| format!("{} {}", d.diff_type, d.label()))
        .collect()
}

/// Forward reaches `target`; rollback restores `source`
fn assert_round_trip(source: &[DatabaseObject], target: &[DatabaseObject]) -> Result<MigrationPlan> {
    let plan = plan(source, target)?;
    let known = known(source, target);

    let migrated = apply(source, &plan.forward, &known)?;
    let remaining = compare(&migrated, target);
    assert!(
        remaining.is_empty(),
        "forward plan left differences: {:?}",
        describe(&remaining)
    );

    let restored = apply(&migrated, &plan.rollback, &known)?;
    let remaining = compare(&restored, source);
    assert!(
        remaining.is_empty(),
        "rollback left differences: {:?}",
        describe(&remaining)
    );

    Ok(plan)
}

#[test]
fn test_full_schema_round_trip() -> Result<()> {
    let (current, desired) = (current_schema(), desired_schema());
    let plan = assert_round_trip(&current, &desired)?;

    assert!(plan.warnings.is_empty(), "unexpected warnings: {:?}", plan.warnings);
    Ok(())
}

#[test]
fn test_full_schema_differences() {
    let differences = compare(&current_schema(), &desired_schema());
    let described = describe(&differences);

    for expected in [
        "added view app.active_users",
        "added view app.user_orders",
        "added trigger app.users_touch on users",
        "added sequence app.invoice_number_seq",
        "modified table app.users",
        "modified role reporting",
        "modified extension pgcrypto",
        "modified tablespace fast",
        "moved view analytics.order_counts",
    ] {
        assert!(
            described.iter().any(|d| d == expected),
            "missing {:?} in {:?}",
            expected,
            described
        );
    }
    assert!(differences.iter().all(|d| !d.has_data_loss()));
}

#[test]
fn test_rollback_of_additions_is_empty_schema() -> Result<()> {
    let desired = desired_schema();
    let plan = assert_round_trip(&[], &desired)?;

    assert!(
        plan.forward
            .iter()
            .all(|step| matches!(step, MigrationStep::Create { .. }))
    );
    assert!(
        plan.rollback
            .iter()
            .all(|step| matches!(step, MigrationStep::Drop { .. }))
    );
    Ok(())
}

#[test]
fn test_dropping_everything_round_trips() -> Result<()> {
    let desired = desired_schema();
    let plan = assert_round_trip(&desired, &[])?;

    // Removed tables and the sequence lose their data
    assert!(plan.warnings.iter().any(|w| w.contains("app.users")));
    assert!(plan.warnings.iter().any(|w| w.contains("app.invoice_number_seq")));
    Ok(())
}

#[test]
fn test_table_move_carries_index() -> Result<()> {
    let orders = |schema: &str| {
        vec![
            table(
                schema,
                "orders",
                vec![column("id", "integer", false), column("user_id", "integer", false)],
            ),
            index(schema, "orders_user_id_idx", "orders", &["user_id"]),
        ]
    };
    let (source, target) = (orders("app"), orders("sales"));

    let differences = compare(&source, &target);
    assert_eq!(differences.len(), 2);
    assert!(differences.iter().all(|d| d.diff_type == DiffType::Moved));

    let plan = assert_round_trip(&source, &target)?;
    assert_eq!(plan.forward.len(), 1, "only the table moves: {:?}", plan.forward);
    Ok(())
}

#[rstest]
#[case::widen_integer(column("id", "integer", false), column("id", "bigint", false))]
#[case::drop_not_null(column("id", "integer", false), column("id", "integer", true))]
#[case::add_default(
    column("status", "text", true),
    column_with_default("status", "text", true, "'new'::text")
)]
#[case::not_null_with_default(
    column("status", "text", true),
    column_with_default("status", "text", false, "'new'::text")
)]
#[case::widen_varchar(
    column("email", "character varying(100)", true),
    column("email", "character varying(255)", true)
)]
fn test_column_change_round_trips(
    #[case] before: pgshift::catalog::table::Column,
    #[case] after: pgshift::catalog::table::Column,
) -> Result<()> {
    let source = vec![table("app", "users", vec![before])];
    let target = vec![table("app", "users", vec![after])];

    let plan = assert_round_trip(&source, &target)?;
    assert!(matches!(plan.forward.as_slice(), [MigrationStep::AlterTable { .. }]));
    assert!(plan.warnings.is_empty());
    Ok(())
}

#[test]
fn test_standalone_column_objects_round_trip() -> Result<()> {
    let users = table("app", "users", vec![]);
    let source = vec![
        users.clone(),
        table_column("app", "users", "email", "character varying(100)", true),
    ];
    let target = vec![
        users,
        table_column("app", "users", "email", "text", false),
        table_column("app", "users", "nickname", "text", true),
    ];

    assert_round_trip(&source, &target)?;
    Ok(())
}

#[test]
fn test_narrowing_is_flagged_but_still_planned() -> Result<()> {
    let source = vec![table("app", "users", vec![column("id", "bigint", false)])];
    let target = vec![table("app", "users", vec![column("id", "integer", false)])];

    let plan = plan(&source, &target)?;
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("table app.users"));

    let migrated = apply(&source, &plan.forward, &known(&source, &target))?;
    assert!(compare(&migrated, &target).is_empty());
    Ok(())
}

#[test]
fn test_changed_function_body_is_replaced_in_place() -> Result<()> {
    let users = table("app", "users", vec![column("updated_at", "timestamp with time zone", true)]);
    let users_touch = trigger("app", "users_touch", "users", "app.touch");
    let source = vec![users.clone(), trigger_function("app", "touch"), users_touch.clone()];

    let mut changed = trigger_function("app", "touch");
    if let DatabaseObject::Function(f) = &mut changed {
        f.body = "BEGIN\n  NEW.updated_at := clock_timestamp();\n  RETURN NEW;\nEND;".to_string();
    }
    let target = vec![users, changed, users_touch];

    let plan = assert_round_trip(&source, &target)?;
    assert!(matches!(plan.forward.as_slice(), [MigrationStep::Replace { .. }]));
    assert!(matches!(plan.rollback.as_slice(), [MigrationStep::Replace { .. }]));

    let statements: Vec<String> = plan.forward.iter().flat_map(|s| s.to_sql()).collect();
    assert!(statements[0].starts_with("CREATE OR REPLACE FUNCTION"), "{}", statements[0]);
    assert!(statements[0].contains("clock_timestamp()"));
    Ok(())
}

#[test]
fn test_changed_return_type_recreates_dependents() -> Result<()> {
    let totals = view("app", "totals", "SELECT app.add(1, 2) AS total", &["app.add"]);
    let source = vec![add_function("app"), totals.clone()];

    let mut changed = add_function("app");
    if let DatabaseObject::Function(f) = &mut changed {
        f.return_type = "bigint".to_string();
    }
    let target = vec![changed, totals];

    let plan = assert_round_trip(&source, &target)?;
    let labels: Vec<String> = plan.forward.iter().map(MigrationStep::label).collect();
    assert_eq!(
        labels,
        vec![
            "drop view app.totals",
            "drop function app.add(integer, integer)",
            "create function app.add(integer, integer)",
            "create view app.totals",
        ]
    );
    Ok(())
}

#[test]
fn test_changed_materialized_view_recreates_view_chain() -> Result<()> {
    let users = table("app", "users", vec![column("id", "integer", false)]);
    let summary = view("app", "stats_summary", "SELECT total FROM app.user_stats", &["app.user_stats"]);
    let headline = view("app", "stats_headline", "SELECT total FROM app.stats_summary", &["app.stats_summary"]);
    let stats = |query: &str| materialized_view("app", "user_stats", query, &["app.users"]);

    let source = vec![
        users.clone(),
        stats("SELECT count(*) AS total FROM app.users"),
        summary.clone(),
        headline.clone(),
    ];
    let target = vec![
        users,
        stats("SELECT count(id) AS total FROM app.users"),
        summary,
        headline,
    ];

    let plan = assert_round_trip(&source, &target)?;
    assert_eq!(plan.forward.len(), 6);
    assert_eq!(plan.rollback.len(), 6);
    assert!(
        !plan
            .forward
            .iter()
            .any(|step| matches!(step, MigrationStep::Replace { .. }))
    );
    Ok(())
}
