//! Migration steps and their SQL rendering
//!
//! Steps are built from differences by the script generator and rendered
//! through the [`SqlRenderer`] trait. Each rendered statement carries its
//! own trailing semicolon.

use crate::catalog::role::Role;
use crate::catalog::{DatabaseObject, ObjectRef, ObjectType};
use crate::diff::types::{SchemaDifference, meta};
use crate::error::MigrationError;
use crate::render::cluster::role_options;
use crate::render::{escape_string, or_replace, quote_ident, schema_qualified};

pub use table::*;

pub mod table;

/// The object a step acts on, as recorded in a difference's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTarget {
    pub object_type: ObjectType,
    pub schema: String,
    pub name: String,
    /// Parent table of triggers, constraints, columns and indexes
    pub table_name: Option<String>,
    /// Parameter signature of functions and procedures
    pub signature: Option<String>,
}

fn required<'a>(
    diff: &'a SchemaDifference,
    key: &str,
    allow_empty: bool,
) -> Result<&'a str, MigrationError> {
    match diff.metadata_str(key) {
        Some(value) if allow_empty || !value.trim().is_empty() => Ok(value),
        _ => Err(MigrationError::MissingMetadata {
            object_type: diff.object_type,
            object: format!("{}.{}", diff.schema, diff.object_name),
            field: key.to_string(),
        }),
    }
}

impl StepTarget {
    /// Build from a difference, failing when metadata needed to address the
    /// object is missing or empty
    pub fn from_difference(diff: &SchemaDifference) -> Result<Self, MigrationError> {
        let object_type = diff.object_type;

        let table_name = if object_type.is_table_scoped() {
            Some(required(diff, meta::TABLE_NAME, false)?.to_string())
        } else {
            None
        };

        // Zero-argument routines have an empty signature
        let signature = if object_type.is_routine() {
            Some(required(diff, meta::SIGNATURE, true)?.to_string())
        } else {
            None
        };

        Ok(Self {
            object_type,
            schema: diff.schema.clone(),
            name: diff.object_name.clone(),
            table_name,
            signature,
        })
    }

    /// Address an object taken from a snapshot
    pub fn from_object(object: &DatabaseObject) -> Self {
        Self {
            object_type: object.object_type(),
            schema: object.schema().to_string(),
            name: object.name().to_string(),
            table_name: object.table_name().map(str::to_string),
            signature: object.signature().map(str::to_string),
        }
    }

    /// Same object addressed in another schema
    pub fn in_schema(&self, schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            ..self.clone()
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.schema, &self.name)
    }

    pub fn label(&self) -> String {
        match (&self.table_name, &self.signature) {
            (Some(table), _) => format!("{} {}.{} on {}", self.object_type, self.schema, self.name, table),
            (_, Some(signature)) => {
                format!("{} {}.{}({})", self.object_type, self.schema, self.name, signature)
            }
            _ if self.object_type.is_schema_less() => format!("{} {}", self.object_type, self.name),
            _ => format!("{} {}.{}", self.object_type, self.schema, self.name),
        }
    }

    fn table(&self) -> String {
        schema_qualified(&self.schema, self.table_name.as_deref().unwrap_or_default())
    }
}

/// `DROP` statement for the object addressed by `target`
pub fn render_drop(target: &StepTarget) -> String {
    let keyword = target.object_type.keyword();
    match target.object_type {
        ObjectType::Trigger => format!(
            "DROP TRIGGER IF EXISTS {} ON {};",
            quote_ident(&target.name),
            target.table()
        ),
        ObjectType::Function | ObjectType::Procedure => format!(
            "DROP {} IF EXISTS {}({});",
            keyword,
            schema_qualified(&target.schema, &target.name),
            target.signature.as_deref().unwrap_or_default()
        ),
        ObjectType::Constraint | ObjectType::Column => format!(
            "ALTER TABLE {} DROP {} IF EXISTS {};",
            target.table(),
            keyword,
            quote_ident(&target.name)
        ),
        ObjectType::Role | ObjectType::Tablespace | ObjectType::Extension => {
            format!("DROP {} IF EXISTS {};", keyword, quote_ident(&target.name))
        }
        _ => format!(
            "DROP {} IF EXISTS {};",
            keyword,
            schema_qualified(&target.schema, &target.name)
        ),
    }
}

/// `DROP` statement for the object a difference describes.
///
/// Fails with [`MigrationError::MissingMetadata`] rather than emitting a
/// placeholder when the parent table or signature is unknown.
pub fn generate_drop_sql(diff: &SchemaDifference) -> Result<String, MigrationError> {
    Ok(render_drop(&StepTarget::from_difference(diff)?))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Drop,
    Alter,
    Create,
}

#[derive(Debug, Clone)]
pub enum MigrationStep {
    Create {
        target: StepTarget,
        definition: String,
        depends_on: Vec<ObjectRef>,
    },
    Drop {
        target: StepTarget,
        depends_on: Vec<ObjectRef>,
    },
    /// `CREATE OR REPLACE` over an existing view or routine
    Replace {
        target: StepTarget,
        definition: String,
        depends_on: Vec<ObjectRef>,
    },
    Move {
        target: StepTarget,
        to_schema: String,
    },
    AlterTable {
        /// The table or foreign table itself
        target: StepTarget,
        actions: Vec<ColumnAction>,
    },
    AlterRole {
        role: Role,
    },
    UpdateExtension {
        name: String,
        version: Option<String>,
    },
    AlterTablespaceOwner {
        name: String,
        owner: String,
    },
}

/// Trait for rendering SQL from operations
pub trait SqlRenderer {
    fn to_sql(&self) -> Vec<String>;
    fn object_ref(&self) -> ObjectRef;
}

impl SqlRenderer for MigrationStep {
    fn to_sql(&self) -> Vec<String> {
        match self {
            MigrationStep::Create { definition, .. } => {
                vec![format!("{};", definition.trim_end_matches(';'))]
            }
            MigrationStep::Replace { definition, .. } => {
                vec![format!("{};", or_replace(definition))]
            }
            MigrationStep::Drop { target, .. } => vec![render_drop(target)],
            MigrationStep::Move { target, to_schema } => {
                let keyword = target.object_type.keyword();
                let sql = match target.object_type {
                    ObjectType::Extension => format!(
                        "ALTER EXTENSION {} SET SCHEMA {};",
                        quote_ident(&target.name),
                        quote_ident(to_schema)
                    ),
                    _ => format!(
                        "ALTER {} {}{} SET SCHEMA {};",
                        keyword,
                        schema_qualified(&target.schema, &target.name),
                        target
                            .signature
                            .as_ref()
                            .map(|s| format!("({})", s))
                            .unwrap_or_default(),
                        quote_ident(to_schema)
                    ),
                };
                vec![sql]
            }
            MigrationStep::AlterTable { target, actions } => {
                let table = schema_qualified(&target.schema, &target.name);
                let foreign = target.object_type == ObjectType::ForeignTable;
                let keyword = if foreign { "FOREIGN TABLE" } else { "TABLE" };
                actions
                    .iter()
                    .map(|action| action.to_sql(keyword, &table, foreign))
                    .collect()
            }
            MigrationStep::AlterRole { role } => vec![format!(
                "ALTER ROLE {} WITH {};",
                quote_ident(&role.identity.name),
                role_options(role)
            )],
            MigrationStep::UpdateExtension { name, version } => {
                let to = version
                    .as_ref()
                    .map(|v| format!(" TO {}", escape_string(v)))
                    .unwrap_or_default();
                vec![format!("ALTER EXTENSION {} UPDATE{};", quote_ident(name), to)]
            }
            MigrationStep::AlterTablespaceOwner { name, owner } => {
                vec![format!(
                    "ALTER TABLESPACE {} OWNER TO {};",
                    quote_ident(name),
                    quote_ident(owner)
                )]
            }
        }
    }

    fn object_ref(&self) -> ObjectRef {
        match self {
            MigrationStep::Create { target, .. }
            | MigrationStep::Drop { target, .. }
            | MigrationStep::Replace { target, .. }
            | MigrationStep::AlterTable { target, .. } => target.object_ref(),
            MigrationStep::Move { target, to_schema } => ObjectRef::new(to_schema, &target.name),
            MigrationStep::AlterRole { role } => ObjectRef::new("", &role.identity.name),
            MigrationStep::UpdateExtension { name, .. }
            | MigrationStep::AlterTablespaceOwner { name, .. } => ObjectRef::new("", name),
        }
    }
}

impl MigrationStep {
    pub fn phase(&self) -> Phase {
        match self {
            MigrationStep::Drop { .. } => Phase::Drop,
            // Replacements may refer to objects created in this migration
            MigrationStep::Create { .. } | MigrationStep::Replace { .. } => Phase::Create,
            _ => Phase::Alter,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            MigrationStep::Create { target, .. }
            | MigrationStep::Drop { target, .. }
            | MigrationStep::Replace { target, .. }
            | MigrationStep::Move { target, .. }
            | MigrationStep::AlterTable { target, .. } => target.object_type,
            MigrationStep::AlterRole { .. } => ObjectType::Role,
            MigrationStep::UpdateExtension { .. } => ObjectType::Extension,
            MigrationStep::AlterTablespaceOwner { .. } => ObjectType::Tablespace,
        }
    }

    /// Position within its phase before explicit dependencies are applied
    pub fn rank(&self) -> usize {
        match self.phase() {
            Phase::Drop => self.object_type().drop_rank(),
            _ => self.object_type().create_rank(),
        }
    }

    /// Objects that must exist while this step runs
    pub fn dependencies(&self) -> &[ObjectRef] {
        match self {
            MigrationStep::Create { depends_on, .. }
            | MigrationStep::Drop { depends_on, .. }
            | MigrationStep::Replace { depends_on, .. } => depends_on,
            _ => &[],
        }
    }

    pub fn label(&self) -> String {
        let action = match self {
            MigrationStep::Create { .. } => "create",
            MigrationStep::Drop { .. } => "drop",
            MigrationStep::Replace { .. } => "replace",
            MigrationStep::Move { .. } => "move",
            _ => "alter",
        };
        let object = match self {
            MigrationStep::Create { target, .. }
            | MigrationStep::Drop { target, .. }
            | MigrationStep::Replace { target, .. }
            | MigrationStep::Move { target, .. }
            | MigrationStep::AlterTable { target, .. } => target.label(),
            other => format!("{} {}", other.object_type(), other.object_ref().name),
        };
        format!("{} {}", action, object)
    }
}
