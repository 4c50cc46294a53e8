use pgshift::catalog::DatabaseObject;
use pgshift::diff::{CompareOptions, ComparisonMode, DiffType, RiskLevel, SchemaComparer};
use rstest::rstest;

use crate::helpers::fixtures::*;

fn differences(
    mode: ComparisonMode,
    options: CompareOptions,
    source: Vec<DatabaseObject>,
    target: Vec<DatabaseObject>,
) -> Vec<(DiffType, String)> {
    SchemaComparer::new(mode, options)
        .compare(&source, &target)
        .into_iter()
        .map(|d| (d.diff_type, d.label()))
        .collect()
}

#[rstest]
#[case::whitespace("SELECT id FROM app.users", "SELECT  id\n  FROM app.users")]
#[case::keyword_case("SELECT id FROM app.users", "select id from app.users")]
#[case::spacing_in_parentheses("SELECT count(*) FROM app.users", "SELECT count( * ) FROM app.users")]
fn test_lenient_mode_ignores_formatting(#[case] source: &str, #[case] target: &str) {
    let source = vec![view("app", "v", source, &[])];
    let target = vec![view("app", "v", target, &[])];

    assert!(
        differences(
            ComparisonMode::Lenient,
            CompareOptions::default(),
            source.clone(),
            target.clone()
        )
        .is_empty()
    );
    assert_eq!(
        differences(ComparisonMode::Strict, CompareOptions::default(), source, target),
        vec![(DiffType::Modified, "view app.v".to_string())]
    );
}

#[test]
fn test_lenient_mode_keeps_string_literals() {
    let source = vec![view("app", "v", "SELECT 'Active' AS status", &[])];
    let target = vec![view("app", "v", "SELECT 'active' AS status", &[])];

    assert_eq!(
        differences(ComparisonMode::Lenient, CompareOptions::default(), source, target).len(),
        1
    );
}

#[rstest]
#[case::sensitive(true, 2)]
#[case::insensitive(false, 1)]
fn test_case_sensitivity(#[case] case_sensitive: bool, #[case] expected: usize) {
    let source = vec![table("app", "Users", vec![column("id", "integer", false)])];
    let target = vec![table("app", "users", vec![column("id", "integer", false)])];
    let options = CompareOptions {
        case_sensitive,
        ..Default::default()
    };

    assert_eq!(
        differences(ComparisonMode::Strict, options, source, target).len(),
        expected
    );
}

#[test]
fn test_system_schemas_need_opt_in() {
    let target = vec![view("pg_catalog", "v", "SELECT 1", &[])];

    assert!(differences(ComparisonMode::Strict, CompareOptions::default(), vec![], target.clone()).is_empty());

    let options = CompareOptions {
        include_system_objects: true,
        ..Default::default()
    };
    assert_eq!(
        differences(ComparisonMode::Strict, options, vec![], target),
        vec![(DiffType::Added, "view pg_catalog.v".to_string())]
    );
}

#[rstest]
#[case::widen("integer", "bigint", RiskLevel::Low)]
#[case::narrow("bigint", "integer", RiskLevel::DataLoss)]
#[case::varchar_grow("character varying(50)", "character varying(100)", RiskLevel::Low)]
#[case::varchar_shrink("character varying(100)", "character varying(50)", RiskLevel::DataLoss)]
#[case::to_text("integer", "text", RiskLevel::Medium)]
fn test_column_type_risk(#[case] from: &str, #[case] to: &str, #[case] risk: RiskLevel) {
    let source = vec![table("app", "t", vec![column("c", from, true)])];
    let target = vec![table("app", "t", vec![column("c", to, true)])];

    let diffs = SchemaComparer::new(ComparisonMode::Strict, CompareOptions::default())
        .compare(&source, &target);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].risk(), risk);
    assert_eq!(diffs[0].has_data_loss(), risk == RiskLevel::DataLoss);
}

#[test]
fn test_dropped_table_loses_data_but_dropped_view_does_not() {
    let source = vec![
        table("app", "legacy", vec![column("id", "integer", false)]),
        view("app", "legacy_view", "SELECT 1", &[]),
    ];
    let diffs = SchemaComparer::new(ComparisonMode::Strict, CompareOptions::default())
        .compare(&source, &[]);

    let table = diffs.iter().find(|d| d.object_name == "legacy").map(|d| d.has_data_loss());
    let view = diffs.iter().find(|d| d.object_name == "legacy_view").map(|d| d.has_data_loss());
    assert_eq!(table, Some(true));
    assert_eq!(view, Some(false));
}
