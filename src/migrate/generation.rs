use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::role::Role;
use crate::catalog::{DatabaseObject, ObjectIdentity, ObjectRef, ObjectType};
use crate::diff::operations::{ColumnAction, MigrationStep, SqlRenderer, StepTarget};
use crate::diff::order_steps;
use crate::diff::types::{DetailKind, DiffType, SchemaComparison, SchemaDifference, meta};
use crate::error::MigrationError;
use crate::migrate::script::{
    MigrationScript, MigrationStatus, MigrationType, checksum, render_script,
};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub migration_type: MigrationType,
    pub dry_run: bool,
}

/// Ordered forward and rollback steps for a set of differences
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub forward: Vec<MigrationStep>,
    pub rollback: Vec<MigrationStep>,
    pub warnings: Vec<String>,
}

fn missing_object(diff: &SchemaDifference, side: &'static str) -> MigrationError {
    MigrationError::MissingObject {
        object_type: diff.object_type,
        object: format!("{}.{}", diff.schema, diff.object_name),
        side,
    }
}

fn source_definition(diff: &SchemaDifference) -> Result<String, MigrationError> {
    diff.source_definition
        .clone()
        .or_else(|| diff.source.as_ref().map(DatabaseObject::definition))
        .ok_or_else(|| missing_object(diff, "source"))
}

fn target_definition(diff: &SchemaDifference) -> Result<String, MigrationError> {
    diff.target_definition
        .clone()
        .or_else(|| diff.target.as_ref().map(DatabaseObject::definition))
        .ok_or_else(|| missing_object(diff, "target"))
}

fn dependencies(object: &Option<DatabaseObject>) -> Vec<ObjectRef> {
    object
        .as_ref()
        .map(DatabaseObject::dependencies)
        .unwrap_or_default()
}

/// Whether `CREATE OR REPLACE` can turn the source object into the target;
/// routines must keep their parameters and return type
fn can_replace(diff: &SchemaDifference) -> bool {
    match (&diff.source, &diff.target) {
        (Some(DatabaseObject::Function(s)), Some(DatabaseObject::Function(t))) => {
            s.arguments == t.arguments
                && s.parameters == t.parameters
                && s.return_type == t.return_type
        }
        (Some(DatabaseObject::Procedure(s)), Some(DatabaseObject::Procedure(t))) => {
            s.arguments == t.arguments && s.parameters == t.parameters
        }
        (Some(DatabaseObject::View(_)), Some(DatabaseObject::View(_))) => true,
        _ => false,
    }
}

fn required_str<'a>(diff: &'a SchemaDifference, key: &str) -> Result<&'a str, MigrationError> {
    diff.metadata_str(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MigrationError::MissingMetadata {
            object_type: diff.object_type,
            object: format!("{}.{}", diff.schema, diff.object_name),
            field: key.to_string(),
        })
}

fn required_bool(diff: &SchemaDifference, key: &str) -> Result<bool, MigrationError> {
    diff.metadata_bool(key)
        .ok_or_else(|| MigrationError::MissingMetadata {
            object_type: diff.object_type,
            object: format!("{}.{}", diff.schema, diff.object_name),
            field: key.to_string(),
        })
}

/// Check every key the generator will read before anything is generated
fn validate(diff: &SchemaDifference) -> Result<(), MigrationError> {
    StepTarget::from_difference(diff)?;

    if diff.diff_type == DiffType::Moved {
        required_str(diff, meta::SOURCE_SCHEMA)?;
        required_str(diff, meta::TARGET_SCHEMA)?;
    }

    if diff.diff_type == DiffType::Modified && diff.object_type == ObjectType::Role {
        for key in [
            meta::IS_SUPERUSER,
            meta::CAN_CREATE_DATABASES,
            meta::CAN_CREATE_ROLES,
            meta::CAN_LOGIN,
        ] {
            required_bool(diff, key)?;
        }
    }

    Ok(())
}

/// Forward and inverse column actions for the column-level details
fn column_actions(diff: &SchemaDifference) -> (Vec<ColumnAction>, Vec<ColumnAction>) {
    let mut forward = Vec::new();
    let mut rollback = Vec::new();

    let default_action = |name: &str, default: &Option<String>| match default {
        Some(default) => ColumnAction::SetDefault {
            name: name.to_string(),
            default: default.clone(),
        },
        None => ColumnAction::DropDefault {
            name: name.to_string(),
        },
    };

    for detail in &diff.details {
        match &detail.kind {
            DetailKind::ColumnAdded { column } => {
                forward.push(ColumnAction::Add {
                    column: column.clone(),
                });
                rollback.push(ColumnAction::Drop {
                    name: column.name.clone(),
                });
            }
            DetailKind::ColumnRemoved { column } => {
                forward.push(ColumnAction::Drop {
                    name: column.name.clone(),
                });
                rollback.push(ColumnAction::Add {
                    column: column.clone(),
                });
            }
            DetailKind::ColumnTypeChanged { column, from, to } => {
                forward.push(ColumnAction::AlterType {
                    name: column.clone(),
                    new_type: to.clone(),
                });
                rollback.push(ColumnAction::AlterType {
                    name: column.clone(),
                    new_type: from.clone(),
                });
            }
            DetailKind::NullabilityChanged {
                column,
                to_nullable,
                ..
            } => {
                let name = column.clone();
                if *to_nullable {
                    forward.push(ColumnAction::DropNotNull { name: name.clone() });
                    rollback.push(ColumnAction::SetNotNull { name });
                } else {
                    forward.push(ColumnAction::SetNotNull { name: name.clone() });
                    rollback.push(ColumnAction::DropNotNull { name });
                }
            }
            DetailKind::DefaultChanged { column, from, to } => {
                forward.push(default_action(column, to));
                rollback.push(default_action(column, from));
            }
            _ => {}
        }
    }

    forward.sort_by_key(ColumnAction::priority);
    rollback.sort_by_key(ColumnAction::priority);
    (forward, rollback)
}

fn has_definition_change(diff: &SchemaDifference) -> bool {
    diff.details
        .iter()
        .any(|d| matches!(d.kind, DetailKind::DefinitionChanged { .. }))
}

fn attribute_changes(diff: &SchemaDifference) -> impl Iterator<Item = (&str, &str, &str)> {
    diff.details.iter().filter_map(|d| match &d.kind {
        DetailKind::AttributeChanged {
            attribute,
            from,
            to,
        } => Some((attribute.as_str(), from.as_str(), to.as_str())),
        _ => None,
    })
}

/// Turns selected differences into ordered forward and rollback scripts
#[derive(Debug, Clone, Default)]
pub struct MigrationScriptGenerator;

impl MigrationScriptGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Plan steps for `selected`; metadata of every difference is validated
    /// before any step is built
    pub fn plan(&self, selected: &[SchemaDifference]) -> Result<MigrationPlan, MigrationError> {
        for diff in selected {
            validate(diff)?;
        }

        // Tables whose move is part of this migration carry their
        // indexes, constraints and triggers along
        let moved_tables: BTreeSet<(String, String)> = selected
            .iter()
            .filter(|d| {
                d.diff_type == DiffType::Moved
                    && matches!(
                        d.object_type,
                        ObjectType::Table | ObjectType::ForeignTable | ObjectType::Partition
                    )
            })
            .filter_map(|d| {
                d.metadata_str(meta::SOURCE_SCHEMA)
                    .map(|s| (s.to_string(), d.object_name.clone()))
            })
            .collect();

        let mut plan = MigrationPlan::default();
        for diff in selected {
            self.plan_difference(diff, &moved_tables, &mut plan)?;
        }

        plan.forward = order_steps(plan.forward)?;
        plan.rollback = order_steps(plan.rollback)?;
        Ok(plan)
    }

    fn plan_difference(
        &self,
        diff: &SchemaDifference,
        moved_tables: &BTreeSet<(String, String)>,
        plan: &mut MigrationPlan,
    ) -> Result<(), MigrationError> {
        let target = StepTarget::from_difference(diff)?;
        let label = diff.label();
        debug!("Planning {} {}", diff.diff_type, label);

        for detail in diff.details.iter().filter(|d| d.is_data_loss()) {
            plan.warnings.push(format!("{}: {}", label, detail.description));
        }

        match diff.diff_type {
            DiffType::Added => {
                plan.forward.push(MigrationStep::Create {
                    target: target.clone(),
                    definition: target_definition(diff)?,
                    depends_on: dependencies(&diff.target),
                });
                plan.rollback.push(MigrationStep::Drop {
                    target,
                    depends_on: dependencies(&diff.target),
                });
            }
            DiffType::Removed => {
                plan.forward.push(MigrationStep::Drop {
                    target: target.clone(),
                    depends_on: dependencies(&diff.source),
                });
                plan.rollback.push(MigrationStep::Create {
                    target,
                    definition: source_definition(diff)?,
                    depends_on: dependencies(&diff.source),
                });
            }
            DiffType::Moved => self.plan_move(diff, target, moved_tables, plan)?,
            DiffType::Modified => self.plan_modified(diff, target, plan)?,
        }

        Ok(())
    }

    fn plan_move(
        &self,
        diff: &SchemaDifference,
        target: StepTarget,
        moved_tables: &BTreeSet<(String, String)>,
        plan: &mut MigrationPlan,
    ) -> Result<(), MigrationError> {
        let from = required_str(diff, meta::SOURCE_SCHEMA)?;
        let to = required_str(diff, meta::TARGET_SCHEMA)?;
        let source_target = target.in_schema(from);

        if diff.object_type.supports_set_schema() {
            plan.forward.push(MigrationStep::Move {
                target: source_target,
                to_schema: to.to_string(),
            });
            plan.rollback.push(MigrationStep::Move {
                target: target.in_schema(to),
                to_schema: from.to_string(),
            });
            return Ok(());
        }

        if let Some(table) = &target.table_name
            && moved_tables.contains(&(from.to_string(), table.clone()))
        {
            debug!("{} moves along with its table", diff.label());
            return Ok(());
        }

        if diff.object_type.holds_data() {
            plan.warnings.push(format!(
                "{}: cannot move to schema {} on its own; it is recreated and its data is lost",
                diff.label(),
                to
            ));
        }
        self.plan_recreate(diff, source_target, target, &[], plan)
    }

    /// Drop `old` and create `new`; the rollback drops `new` and recreates `old`.
    /// `dependents` are dropped first and recreated afterwards in both directions.
    fn plan_recreate(
        &self,
        diff: &SchemaDifference,
        old: StepTarget,
        new: StepTarget,
        dependents: &[DatabaseObject],
        plan: &mut MigrationPlan,
    ) -> Result<(), MigrationError> {
        let (source_def, target_def) = (source_definition(diff)?, target_definition(diff)?);
        let (source_deps, target_deps) = (dependencies(&diff.source), dependencies(&diff.target));

        for dependent in dependents {
            let target = StepTarget::from_object(dependent);
            let planned = plan.forward.iter().any(
                |step| matches!(step, MigrationStep::Drop { target: t, .. } if *t == target),
            );
            if planned {
                continue;
            }
            debug!(
                "{} {} is recreated along with {}",
                dependent.object_type(),
                dependent.qualified_name(),
                diff.label()
            );

            let depends_on = dependent.dependencies();
            for steps in [&mut plan.forward, &mut plan.rollback] {
                steps.push(MigrationStep::Drop {
                    target: target.clone(),
                    depends_on: depends_on.clone(),
                });
                steps.push(MigrationStep::Create {
                    target: target.clone(),
                    definition: dependent.definition(),
                    depends_on: depends_on.clone(),
                });
            }
        }

        plan.forward.push(MigrationStep::Drop {
            target: old.clone(),
            depends_on: source_deps.clone(),
        });
        plan.forward.push(MigrationStep::Create {
            target: new.clone(),
            definition: target_def,
            depends_on: target_deps.clone(),
        });
        plan.rollback.push(MigrationStep::Drop {
            target: new,
            depends_on: target_deps,
        });
        plan.rollback.push(MigrationStep::Create {
            target: old,
            definition: source_def,
            depends_on: source_deps,
        });
        Ok(())
    }

    fn plan_modified(
        &self,
        diff: &SchemaDifference,
        target: StepTarget,
        plan: &mut MigrationPlan,
    ) -> Result<(), MigrationError> {
        match diff.object_type {
            ObjectType::Table | ObjectType::ForeignTable if !has_definition_change(diff) => {
                if diff
                    .details
                    .iter()
                    .any(|d| d.kind == DetailKind::ColumnOrderChanged)
                {
                    plan.warnings.push(format!(
                        "{}: column order differs; ALTER TABLE cannot reorder columns so no statement is generated for it",
                        diff.label()
                    ));
                }
                self.plan_alter_table(diff, target, plan);
                Ok(())
            }
            ObjectType::Column => {
                let table = StepTarget {
                    object_type: ObjectType::Table,
                    schema: target.schema.clone(),
                    name: target.table_name.clone().unwrap_or_default(),
                    table_name: None,
                    signature: None,
                };
                self.plan_alter_table(diff, table, plan);
                Ok(())
            }
            ObjectType::Role => {
                let role = Role {
                    identity: ObjectIdentity::new(
                        diff.metadata_str(meta::DATABASE).unwrap_or_default(),
                        "",
                        diff.object_name.clone(),
                    ),
                    is_superuser: required_bool(diff, meta::IS_SUPERUSER)?,
                    can_create_databases: required_bool(diff, meta::CAN_CREATE_DATABASES)?,
                    can_create_roles: required_bool(diff, meta::CAN_CREATE_ROLES)?,
                    can_login: required_bool(diff, meta::CAN_LOGIN)?,
                };

                let mut previous = role.clone();
                for (attribute, from, _) in attribute_changes(diff) {
                    let from = from == "true";
                    match attribute {
                        "SUPERUSER" => previous.is_superuser = from,
                        "CREATEDB" => previous.can_create_databases = from,
                        "CREATEROLE" => previous.can_create_roles = from,
                        "LOGIN" => previous.can_login = from,
                        other => warn!("Ignoring unknown role attribute {}", other),
                    }
                }

                plan.forward.push(MigrationStep::AlterRole { role });
                plan.rollback.push(MigrationStep::AlterRole { role: previous });
                Ok(())
            }
            ObjectType::Extension => {
                let version = |v: &str| (v != "default").then(|| v.to_string());
                let previous = attribute_changes(diff)
                    .find(|(attribute, _, _)| *attribute == "version")
                    .and_then(|(_, from, _)| version(from));

                plan.forward.push(MigrationStep::UpdateExtension {
                    name: diff.object_name.clone(),
                    version: diff.metadata_str(meta::EXT_VERSION).map(str::to_string),
                });
                plan.rollback.push(MigrationStep::UpdateExtension {
                    name: diff.object_name.clone(),
                    version: previous,
                });
                Ok(())
            }
            ObjectType::Tablespace
                if !diff.details.is_empty()
                    && attribute_changes(diff).all(|(attribute, _, _)| attribute == "owner")
                    && attribute_changes(diff).count() == diff.details.len() =>
            {
                if let Some((_, from, to)) = attribute_changes(diff).next() {
                    plan.forward.push(MigrationStep::AlterTablespaceOwner {
                        name: diff.object_name.clone(),
                        owner: to.to_string(),
                    });
                    plan.rollback.push(MigrationStep::AlterTablespaceOwner {
                        name: diff.object_name.clone(),
                        owner: from.to_string(),
                    });
                }
                Ok(())
            }
            ObjectType::Function | ObjectType::Procedure | ObjectType::View
                if can_replace(diff) =>
            {
                plan.forward.push(MigrationStep::Replace {
                    target: target.clone(),
                    definition: target_definition(diff)?,
                    depends_on: dependencies(&diff.target),
                });
                plan.rollback.push(MigrationStep::Replace {
                    target,
                    definition: source_definition(diff)?,
                    depends_on: dependencies(&diff.source),
                });
                Ok(())
            }
            _ => self.plan_recreate(diff, target.clone(), target, &diff.dependents, plan),
        }
    }

    fn plan_alter_table(&self, diff: &SchemaDifference, table: StepTarget, plan: &mut MigrationPlan) {
        let (forward, rollback) = column_actions(diff);
        if forward.is_empty() {
            return;
        }
        plan.forward.push(MigrationStep::AlterTable {
            target: table.clone(),
            actions: forward,
        });
        plan.rollback.push(MigrationStep::AlterTable {
            target: table,
            actions: rollback,
        });
    }

    /// Build the migration script for the selected differences of `comparison`
    pub fn generate(
        &self,
        comparison: &SchemaComparison,
        selected: &[SchemaDifference],
        options: &GenerateOptions,
    ) -> Result<MigrationScript, MigrationError> {
        if options.migration_type == MigrationType::Data {
            return Err(MigrationError::UnsupportedMigrationType(
                options.migration_type.to_string(),
            ));
        }

        info!("Generating migration for {} differences...", selected.len());
        let mut plan = self.plan(selected)?;
        if options.migration_type == MigrationType::Full {
            plan.warnings.push(
                "Data migration is not supported; only schema changes were generated".to_string(),
            );
        }

        let render = |steps: &[MigrationStep]| -> Vec<String> {
            steps
                .iter()
                .flat_map(|step| step.to_sql())
                .collect()
        };
        let statements = render(&plan.forward);
        let rollback_statements = render(&plan.rollback);

        for warning in &plan.warnings {
            warn!("{}", warning);
        }

        let sql_script = render_script("migration", comparison, &plan.warnings, &statements);
        let rollback_script = render_script("rollback", comparison, &[], &rollback_statements);

        info!(
            "Generated {} statements ({} rollback statements)",
            statements.len(),
            rollback_statements.len()
        );

        Ok(MigrationScript {
            id: Uuid::new_v4(),
            comparison: comparison.clone(),
            selected_differences: selected.to_vec(),
            checksum: checksum(&sql_script),
            sql_script,
            rollback_script,
            migration_type: options.migration_type,
            is_dry_run: options.dry_run,
            status: if options.dry_run {
                MigrationStatus::Draft
            } else {
                MigrationStatus::Ready
            },
            warnings: plan.warnings,
            statements,
            rollback_statements,
            created_at: Utc::now(),
        })
    }
}
