//! Typed details explaining why two versions of an object differ.

use similar::TextDiff;

use crate::catalog::DatabaseObject;
use crate::catalog::table::Column;
use crate::diff::diff_list;
use crate::diff::types::{DetailKind, DifferenceDetail, RiskLevel};

/// Unified line diff between two definitions
pub fn definition_diff(source: &str, target: &str) -> String {
    TextDiff::from_lines(source, target)
        .unified_diff()
        .header("source", "target")
        .to_string()
}

fn canonical_type(data_type: &str) -> String {
    let lowered = data_type.trim().to_lowercase();
    let (base, params) = match lowered.split_once('(') {
        Some((base, rest)) => (base.trim(), format!("({}", rest.replace(' ', ""))),
        None => (lowered.as_str(), String::new()),
    };

    let base = match base {
        "int" | "int4" => "integer",
        "int2" => "smallint",
        "int8" => "bigint",
        "float4" => "real",
        "float8" | "float" => "double precision",
        "varchar" => "character varying",
        "char" | "bpchar" => "character",
        "bool" => "boolean",
        "decimal" => "numeric",
        "timestamptz" => "timestamp with time zone",
        "timestamp" => "timestamp without time zone",
        other => other,
    };
    format!("{}{}", base, params)
}

/// Split `numeric(10,2)` into `("numeric", [10, 2])`
fn split_params(data_type: &str) -> (&str, Vec<u32>) {
    match data_type.split_once('(') {
        Some((base, rest)) => {
            let params = rest
                .trim_end_matches(')')
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect();
            (base, params)
        }
        None => (data_type, Vec::new()),
    }
}

fn integer_rank(base: &str) -> Option<u32> {
    match base {
        "smallint" => Some(1),
        "integer" => Some(2),
        "bigint" => Some(3),
        _ => None,
    }
}

/// Decimal digits needed to hold every value of an integer type
fn integer_digits(rank: u32) -> u32 {
    match rank {
        1 => 5,
        2 => 10,
        _ => 19,
    }
}

fn is_character(base: &str) -> bool {
    matches!(base, "character varying" | "character" | "text")
}

/// Risk of changing a column from one type to another.
///
/// Known widenings are low risk; anything not known to be safe is treated
/// as possible data loss.
pub fn type_change_risk(from: &str, to: &str) -> RiskLevel {
    let from = canonical_type(from);
    let to = canonical_type(to);
    if from == to {
        return RiskLevel::Low;
    }

    let (from_base, from_params) = split_params(&from);
    let (to_base, to_params) = split_params(&to);

    let widening = match (from_base, to_base) {
        (f, t) if integer_rank(f).is_some() && integer_rank(t).is_some() => {
            integer_rank(t) >= integer_rank(f)
        }
        (f, "numeric") if integer_rank(f).is_some() => match to_params.as_slice() {
            [] => true,
            [precision] => *precision >= integer_digits(integer_rank(f).unwrap_or(3)),
            [precision, scale, ..] => {
                precision.saturating_sub(*scale) >= integer_digits(integer_rank(f).unwrap_or(3))
            }
        },
        ("numeric", "numeric") => match (from_params.as_slice(), to_params.as_slice()) {
            (_, []) => true,
            ([], _) => false,
            ([p1], [p2]) => p2 >= p1,
            ([p1], [p2, s2, ..]) => p2.saturating_sub(*s2) >= *p1,
            ([p1, s1, ..], [p2]) => *s1 == 0 && p2 >= p1,
            ([p1, s1, ..], [p2, s2, ..]) => s2 >= s1 && p2.saturating_sub(*s2) >= p1.saturating_sub(*s1),
        },
        ("real", "double precision") => true,
        (f, "text") if is_character(f) => true,
        (f, "character varying") if is_character(f) => match (from_params.as_slice(), to_params.as_slice()) {
            (_, []) => true,
            ([n], [m]) => m >= n,
            _ => false,
        },
        ("timestamp without time zone", "timestamp with time zone") => {
            return RiskLevel::Medium;
        }
        (_, "text") => return RiskLevel::Medium,
        _ => false,
    };

    if widening {
        RiskLevel::Low
    } else {
        RiskLevel::DataLoss
    }
}

/// Column-level differences between two versions of a table
pub fn column_details(source: &[Column], target: &[Column]) -> Vec<DifferenceDetail> {
    let mut details = diff_list(source, target, |c| c.name.clone(), column_diff);

    let common: Vec<&str> = target
        .iter()
        .filter(|t| source.iter().any(|s| s.name == t.name))
        .map(|t| t.name.as_str())
        .collect();
    let source_order: Vec<&str> = source
        .iter()
        .filter(|s| common.contains(&s.name.as_str()))
        .map(|s| s.name.as_str())
        .collect();
    if source_order != common {
        details.push(DifferenceDetail::new(
            DetailKind::ColumnOrderChanged,
            "Column order differs",
            RiskLevel::Low,
        ));
    }

    details
}

fn column_diff(source: Option<&Column>, target: Option<&Column>) -> Vec<DifferenceDetail> {
    match (source, target) {
        (None, Some(t)) => {
            let kind = DetailKind::ColumnAdded { column: t.clone() };
            if !t.is_nullable && t.default.is_none() {
                vec![DifferenceDetail::data_loss(
                    kind,
                    format!(
                        "Column {} {} added as NOT NULL without a default; existing rows must be removed or the statement fails",
                        t.name, t.data_type
                    ),
                )]
            } else {
                vec![DifferenceDetail::new(
                    kind,
                    format!("Column {} {} added", t.name, t.data_type),
                    RiskLevel::Low,
                )]
            }
        }
        (Some(s), None) => vec![DifferenceDetail::data_loss(
            DetailKind::ColumnRemoved { column: s.clone() },
            format!("Column {} dropped; its data is lost", s.name),
        )],
        (Some(s), Some(t)) => {
            let mut details = Vec::new();

            if s.data_type != t.data_type {
                let risk = type_change_risk(&s.data_type, &t.data_type);
                let description = if risk == RiskLevel::DataLoss {
                    format!(
                        "Column {} narrows from {} to {}; values may be truncated or fail to convert",
                        t.name, s.data_type, t.data_type
                    )
                } else {
                    format!(
                        "Column {} type changes from {} to {}",
                        t.name, s.data_type, t.data_type
                    )
                };
                details.push(DifferenceDetail::new(
                    DetailKind::ColumnTypeChanged {
                        column: t.name.clone(),
                        from: s.data_type.clone(),
                        to: t.data_type.clone(),
                    },
                    description,
                    risk,
                ));
            }

            if s.default != t.default {
                details.push(DifferenceDetail::new(
                    DetailKind::DefaultChanged {
                        column: t.name.clone(),
                        from: s.default.clone(),
                        to: t.default.clone(),
                    },
                    format!("Column {} default changes", t.name),
                    RiskLevel::Low,
                ));
            }

            if s.is_nullable != t.is_nullable {
                let kind = DetailKind::NullabilityChanged {
                    column: t.name.clone(),
                    from_nullable: s.is_nullable,
                    to_nullable: t.is_nullable,
                };
                let detail = if t.is_nullable {
                    DifferenceDetail::new(
                        kind,
                        format!("Column {} becomes nullable", t.name),
                        RiskLevel::Low,
                    )
                } else if t.default.is_none() {
                    DifferenceDetail::data_loss(
                        kind,
                        format!(
                            "Column {} becomes NOT NULL without a default; existing NULL rows must be removed or updated",
                            t.name
                        ),
                    )
                } else {
                    DifferenceDetail::new(
                        kind,
                        format!("Column {} becomes NOT NULL", t.name),
                        RiskLevel::Medium,
                    )
                };
                details.push(detail);
            }

            details
        }
        (None, None) => Vec::new(),
    }
}

fn attribute(name: &str, from: impl ToString, to: impl ToString, risk: RiskLevel) -> DifferenceDetail {
    let (from, to) = (from.to_string(), to.to_string());
    DifferenceDetail::new(
        DetailKind::AttributeChanged {
            attribute: name.to_string(),
            from: from.clone(),
            to: to.clone(),
        },
        format!("{} changes from {} to {}", name, from, to),
        risk,
    )
}

fn definition_changed(source_def: &str, target_def: &str, risk: RiskLevel) -> DifferenceDetail {
    DifferenceDetail::new(
        DetailKind::DefinitionChanged {
            diff: definition_diff(source_def, target_def),
        },
        "Definition changed",
        risk,
    )
}

/// Details for an object present on both sides with differing definitions
pub fn modified_details(source: &DatabaseObject, target: &DatabaseObject) -> Vec<DifferenceDetail> {
    let (source_def, target_def) = (source.definition(), target.definition());

    match (source, target) {
        (DatabaseObject::Table(s), DatabaseObject::Table(t)) => {
            let mut details = column_details(&s.columns, &t.columns);
            if s.partition_by != t.partition_by {
                details.push(DifferenceDetail::data_loss(
                    DetailKind::DefinitionChanged {
                        diff: definition_diff(&source_def, &target_def),
                    },
                    "Partitioning changes; the table must be recreated and its data is lost",
                ));
            }
            details
        }
        (DatabaseObject::ForeignTable(s), DatabaseObject::ForeignTable(t)) => {
            let mut details = column_details(&s.columns, &t.columns);
            if s.server != t.server || s.options != t.options {
                details.push(definition_changed(&source_def, &target_def, RiskLevel::Medium));
            }
            details
        }
        (DatabaseObject::Column(s), DatabaseObject::Column(t)) => {
            column_diff(Some(&s.as_column()), Some(&t.as_column()))
        }
        (DatabaseObject::Role(s), DatabaseObject::Role(t)) => {
            let flags = [
                ("SUPERUSER", s.is_superuser, t.is_superuser, RiskLevel::High),
                ("CREATEDB", s.can_create_databases, t.can_create_databases, RiskLevel::Medium),
                ("CREATEROLE", s.can_create_roles, t.can_create_roles, RiskLevel::Medium),
                ("LOGIN", s.can_login, t.can_login, RiskLevel::Medium),
            ];
            flags
                .into_iter()
                .filter(|(_, from, to, _)| from != to)
                .map(|(name, from, to, risk)| attribute(name, from, to, risk))
                .collect()
        }
        (DatabaseObject::Extension(s), DatabaseObject::Extension(t)) => {
            let version = |v: &Option<String>| v.clone().unwrap_or_else(|| "default".to_string());
            vec![attribute(
                "version",
                version(&s.ext_version),
                version(&t.ext_version),
                RiskLevel::Medium,
            )]
        }
        (DatabaseObject::Tablespace(s), DatabaseObject::Tablespace(t)) => {
            let mut details = Vec::new();
            if s.owner != t.owner {
                details.push(attribute("owner", &s.owner, &t.owner, RiskLevel::Low));
            }
            if s.location != t.location {
                details.push(attribute("location", &s.location, &t.location, RiskLevel::High));
            }
            details
        }
        _ => {
            let object_type = source.object_type();
            if object_type.holds_data() {
                vec![DifferenceDetail::data_loss(
                    DetailKind::DefinitionChanged {
                        diff: definition_diff(&source_def, &target_def),
                    },
                    format!("{} must be recreated; its current state is lost", object_type),
                )]
            } else {
                vec![definition_changed(&source_def, &target_def, RiskLevel::Medium)]
            }
        }
    }
}
