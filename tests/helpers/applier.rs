//! Applies migration steps to an in-memory object list.
//!
//! Stands in for a database when checking that a generated plan really turns
//! one snapshot into the other. Creates look the object up by its rendered
//! definition, replacements by their `CREATE OR REPLACE` form; every other
//! step edits the list in place. A step that would
//! fail on a real server (missing object, missing dependency, dropping
//! something still in use) is reported as an error.

use anyhow::{Result, anyhow, bail};
use pgshift::catalog::table::Column;
use pgshift::catalog::{DatabaseObject, ObjectRef, ObjectType};
use pgshift::diff::operations::{ColumnAction, MigrationStep, StepTarget};
use pgshift::render::or_replace;

pub struct InMemoryApplier {
    pub objects: Vec<DatabaseObject>,
    /// Objects a `Create` step may instantiate
    known: Vec<DatabaseObject>,
}

fn addresses(target: &StepTarget, object: &DatabaseObject) -> bool {
    object.object_type() == target.object_type
        && object.schema() == target.schema
        && object.name() == target.name
        && object.table_name() == target.table_name.as_deref()
        && object.signature() == target.signature.as_deref()
}

fn is_child_of(object: &DatabaseObject, schema: &str, table: &str) -> bool {
    object.object_type().is_table_scoped()
        && object.schema() == schema
        && object.table_name() == Some(table)
}

fn is_table(object_type: ObjectType) -> bool {
    matches!(object_type, ObjectType::Table | ObjectType::ForeignTable)
}

fn apply_action(columns: &mut Vec<Column>, action: &ColumnAction) -> Result<()> {
    if let ColumnAction::Add { column } = action {
        if columns.iter().any(|c| c.name == column.name) {
            bail!("column {} already exists", column.name);
        }
        columns.push(column.clone());
        return Ok(());
    }

    let name = action.column_name();
    if let ColumnAction::Drop { .. } = action {
        columns.retain(|c| c.name != name);
        return Ok(());
    }

    let column = columns
        .iter_mut()
        .find(|c| c.name == name)
        .ok_or_else(|| anyhow!("column {} does not exist", name))?;
    match action {
        ColumnAction::AlterType { new_type, .. } => column.data_type = new_type.clone(),
        ColumnAction::SetDefault { default, .. } => column.default = Some(default.clone()),
        ColumnAction::DropDefault { .. } => column.default = None,
        ColumnAction::SetNotNull { .. } => column.is_nullable = false,
        ColumnAction::DropNotNull { .. } => column.is_nullable = true,
        ColumnAction::Add { .. } | ColumnAction::Drop { .. } => {}
    }
    Ok(())
}

impl InMemoryApplier {
    /// Start from `current`; `known` holds every object either side defines
    pub fn new(current: Vec<DatabaseObject>, known: Vec<DatabaseObject>) -> Self {
        Self {
            objects: current,
            known,
        }
    }

    fn position(&self, target: &StepTarget) -> Result<usize> {
        self.objects
            .iter()
            .position(|o| addresses(target, o))
            .ok_or_else(|| anyhow!("{} does not exist", target.label()))
    }

    fn exists(&self, schema: &str, name: &str) -> bool {
        self.objects
            .iter()
            .any(|o| o.schema() == schema && o.name() == name && !o.object_type().is_table_scoped())
    }

    fn require(&self, target: &StepTarget, depends_on: &[ObjectRef]) -> Result<()> {
        for dependency in depends_on {
            if !self.exists(&dependency.schema, &dependency.name) {
                bail!(
                    "{} needs {}.{} which does not exist yet",
                    target.label(),
                    dependency.schema,
                    dependency.name
                );
            }
        }
        Ok(())
    }

    fn known_as(
        &self,
        definition: &str,
        matches: impl Fn(&DatabaseObject) -> bool,
    ) -> Result<DatabaseObject> {
        self.known
            .iter()
            .find(|o| matches(o))
            .cloned()
            .ok_or_else(|| anyhow!("no object renders as {}", definition))
    }

    pub fn apply_all(&mut self, steps: &[MigrationStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.apply(step)
                .map_err(|e| anyhow!("step {} ({:?}) failed: {}", i + 1, step, e))?;
        }
        Ok(())
    }

    pub fn apply(&mut self, step: &MigrationStep) -> Result<()> {
        match step {
            MigrationStep::Create {
                target,
                definition,
                depends_on,
            } => {
                self.require(target, depends_on)?;
                if self.position(target).is_ok() {
                    bail!("{} already exists", target.label());
                }
                let definition = definition.trim_end_matches(';');
                let object = self.known_as(definition, |o| o.definition() == definition)?;
                self.objects.push(object);
            }
            MigrationStep::Replace {
                target,
                definition,
                depends_on,
            } => {
                self.require(target, depends_on)?;
                let index = self.position(target)?;
                let definition = or_replace(definition);
                let object =
                    self.known_as(&definition, |o| or_replace(&o.definition()) == definition)?;
                if !addresses(target, &object) {
                    bail!("{} cannot become {}", target.label(), object.qualified_name());
                }
                self.objects[index] = object;
            }
            MigrationStep::Drop { target, .. } => {
                let index = self.position(target)?;
                let dropped = self.objects.remove(index);
                if is_table(dropped.object_type()) {
                    self.objects
                        .retain(|o| !is_child_of(o, dropped.schema(), dropped.name()));
                }
                let still_used = self.objects.iter().find(|o| {
                    o.dependencies()
                        .iter()
                        .any(|d| d.schema == dropped.schema() && d.name == dropped.name())
                });
                if let Some(user) = still_used {
                    bail!("{} is still used by {}", target.label(), user.qualified_name());
                }
            }
            MigrationStep::Move { target, to_schema } => {
                let index = self.position(target)?;
                let moved = self.objects[index].with_schema(to_schema);
                let (from, name) = (target.schema.clone(), target.name.clone());
                self.objects[index] = moved;
                if is_table(target.object_type) {
                    for object in self.objects.iter_mut() {
                        if is_child_of(object, &from, &name) {
                            *object = object.with_schema(to_schema);
                        }
                    }
                }
            }
            MigrationStep::AlterTable { target, actions } => {
                self.alter_table(target, actions)?;
            }
            MigrationStep::AlterRole { role } => {
                let index = self
                    .objects
                    .iter()
                    .position(|o| o.object_type() == ObjectType::Role && o.name() == role.identity.name)
                    .ok_or_else(|| anyhow!("role {} does not exist", role.identity.name))?;
                self.objects[index] = DatabaseObject::Role(role.clone());
            }
            MigrationStep::UpdateExtension { name, version } => {
                let extension = self.objects.iter_mut().find_map(|o| match o {
                    DatabaseObject::Extension(e) if &e.identity.name == name => Some(e),
                    _ => None,
                });
                let extension =
                    extension.ok_or_else(|| anyhow!("extension {} does not exist", name))?;
                extension.ext_version = version.clone();
            }
            MigrationStep::AlterTablespaceOwner { name, owner } => {
                let tablespace = self.objects.iter_mut().find_map(|o| match o {
                    DatabaseObject::Tablespace(t) if &t.identity.name == name => Some(t),
                    _ => None,
                });
                let tablespace =
                    tablespace.ok_or_else(|| anyhow!("tablespace {} does not exist", name))?;
                tablespace.owner = owner.clone();
            }
        }
        Ok(())
    }

    fn alter_table(&mut self, target: &StepTarget, actions: &[ColumnAction]) -> Result<()> {
        for action in actions {
            self.alter_column(target, action)?;
        }
        Ok(())
    }

    fn alter_column(&mut self, target: &StepTarget, action: &ColumnAction) -> Result<()> {
        // Columns tracked as objects of their own win over the table's list
        let standalone = self.objects.iter().position(|o| match o {
            DatabaseObject::Column(c) => {
                c.identity.schema == target.schema
                    && c.table_name == target.name
                    && c.identity.name == action.column_name()
            }
            _ => false,
        });

        let Some(index) = standalone else {
            let table = self
                .objects
                .iter_mut()
                .find(|o| {
                    is_table(o.object_type()) && o.schema() == target.schema && o.name() == target.name
                })
                .ok_or_else(|| anyhow!("{} does not exist", target.label()))?;
            let columns = match table {
                DatabaseObject::Table(t) => &mut t.columns,
                DatabaseObject::ForeignTable(t) => &mut t.columns,
                _ => unreachable!(),
            };
            return apply_action(columns, action);
        };

        {
            let DatabaseObject::Column(column) = &mut self.objects[index] else {
                unreachable!()
            };
            let mut as_column = vec![column.as_column()];
            apply_action(&mut as_column, action)?;
            if let Some(updated) = as_column.pop() {
                column.data_type = updated.data_type;
                column.default = updated.default;
                column.is_nullable = updated.is_nullable;
                return Ok(());
            }
        }
        self.objects.remove(index);
        Ok(())
    }
}
