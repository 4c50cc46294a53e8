//! Object model for PostgreSQL schema snapshots.

use serde::{Deserialize, Serialize};

pub mod collation;
pub mod constraint;
pub mod custom_type;
pub mod domain;
pub mod extension;
pub mod extract;
pub mod foreign_table;
pub mod function;
pub mod id;
pub mod index;
pub mod partition;
pub mod role;
pub mod sequence;
pub mod table;
pub mod tablespace;
pub mod triggers;
pub mod utils;
pub mod view;

pub use id::{ObjectIdentity, ObjectKey, ObjectType};

use crate::render;
use utils::split_qualified;

/// Any object that can appear in a schema snapshot.
///
/// Objects are built once from a snapshot and never mutated during a
/// comparison; `definition()` renders the `CREATE` statement from the
/// attributes alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "object_type")]
pub enum DatabaseObject {
    Table(table::Table),
    View(view::View),
    MaterializedView(view::MaterializedView),
    Function(function::Function),
    Procedure(function::Procedure),
    Sequence(sequence::Sequence),
    Index(index::Index),
    Type(custom_type::CustomType),
    Domain(domain::Domain),
    Trigger(triggers::Trigger),
    Constraint(constraint::Constraint),
    Extension(extension::Extension),
    Collation(collation::Collation),
    Role(role::Role),
    Tablespace(tablespace::Tablespace),
    Column(table::TableColumn),
    ForeignTable(foreign_table::ForeignTable),
    Partition(partition::Partition),
}

/// Reference from one object to a relation or routine it needs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub schema: String,
    pub name: String,
}

impl ObjectRef {
    fn parse(reference: &str, default_schema: &str) -> Self {
        let (schema, name) = split_qualified(reference, default_schema);
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }
}

impl DatabaseObject {
    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            DatabaseObject::Table(o) => &o.identity,
            DatabaseObject::View(o) => &o.identity,
            DatabaseObject::MaterializedView(o) => &o.identity,
            DatabaseObject::Function(o) => &o.identity,
            DatabaseObject::Procedure(o) => &o.identity,
            DatabaseObject::Sequence(o) => &o.identity,
            DatabaseObject::Index(o) => &o.identity,
            DatabaseObject::Type(o) => &o.identity,
            DatabaseObject::Domain(o) => &o.identity,
            DatabaseObject::Trigger(o) => &o.identity,
            DatabaseObject::Constraint(o) => &o.identity,
            DatabaseObject::Extension(o) => &o.identity,
            DatabaseObject::Collation(o) => &o.identity,
            DatabaseObject::Role(o) => &o.identity,
            DatabaseObject::Tablespace(o) => &o.identity,
            DatabaseObject::Column(o) => &o.identity,
            DatabaseObject::ForeignTable(o) => &o.identity,
            DatabaseObject::Partition(o) => &o.identity,
        }
    }

    fn identity_mut(&mut self) -> &mut ObjectIdentity {
        match self {
            DatabaseObject::Table(o) => &mut o.identity,
            DatabaseObject::View(o) => &mut o.identity,
            DatabaseObject::MaterializedView(o) => &mut o.identity,
            DatabaseObject::Function(o) => &mut o.identity,
            DatabaseObject::Procedure(o) => &mut o.identity,
            DatabaseObject::Sequence(o) => &mut o.identity,
            DatabaseObject::Index(o) => &mut o.identity,
            DatabaseObject::Type(o) => &mut o.identity,
            DatabaseObject::Domain(o) => &mut o.identity,
            DatabaseObject::Trigger(o) => &mut o.identity,
            DatabaseObject::Constraint(o) => &mut o.identity,
            DatabaseObject::Extension(o) => &mut o.identity,
            DatabaseObject::Collation(o) => &mut o.identity,
            DatabaseObject::Role(o) => &mut o.identity,
            DatabaseObject::Tablespace(o) => &mut o.identity,
            DatabaseObject::Column(o) => &mut o.identity,
            DatabaseObject::ForeignTable(o) => &mut o.identity,
            DatabaseObject::Partition(o) => &mut o.identity,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            DatabaseObject::Table(_) => ObjectType::Table,
            DatabaseObject::View(_) => ObjectType::View,
            DatabaseObject::MaterializedView(_) => ObjectType::MaterializedView,
            DatabaseObject::Function(_) => ObjectType::Function,
            DatabaseObject::Procedure(_) => ObjectType::Procedure,
            DatabaseObject::Sequence(_) => ObjectType::Sequence,
            DatabaseObject::Index(_) => ObjectType::Index,
            DatabaseObject::Type(_) => ObjectType::Type,
            DatabaseObject::Domain(_) => ObjectType::Domain,
            DatabaseObject::Trigger(_) => ObjectType::Trigger,
            DatabaseObject::Constraint(_) => ObjectType::Constraint,
            DatabaseObject::Extension(_) => ObjectType::Extension,
            DatabaseObject::Collation(_) => ObjectType::Collation,
            DatabaseObject::Role(_) => ObjectType::Role,
            DatabaseObject::Tablespace(_) => ObjectType::Tablespace,
            DatabaseObject::Column(_) => ObjectType::Column,
            DatabaseObject::ForeignTable(_) => ObjectType::ForeignTable,
            DatabaseObject::Partition(_) => ObjectType::Partition,
        }
    }

    pub fn name(&self) -> &str {
        &self.identity().name
    }

    pub fn schema(&self) -> &str {
        &self.identity().schema
    }

    pub fn qualified_name(&self) -> String {
        self.identity().qualified_name()
    }

    /// Parent table of table-scoped objects
    pub fn table_name(&self) -> Option<&str> {
        match self {
            DatabaseObject::Index(o) => Some(&o.table_name),
            DatabaseObject::Trigger(o) => Some(&o.table_name),
            DatabaseObject::Constraint(o) => Some(&o.table_name),
            DatabaseObject::Column(o) => Some(&o.table_name),
            _ => None,
        }
    }

    /// Parameter signature of functions and procedures
    pub fn signature(&self) -> Option<&str> {
        match self {
            DatabaseObject::Function(o) => Some(&o.arguments),
            DatabaseObject::Procedure(o) => Some(&o.arguments),
            _ => None,
        }
    }

    /// Part of the key besides type, schema and name
    pub fn qualifier(&self) -> Option<String> {
        match self {
            // Index names are unique per schema, not per table
            DatabaseObject::Index(_) => None,
            _ => self
                .table_name()
                .or_else(|| self.signature())
                .map(str::to_string),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            object_type: self.object_type(),
            schema: self.schema().to_string(),
            name: self.name().to_string(),
            qualifier: self.qualifier(),
        }
    }

    /// The object's `CREATE ...` statement, without a trailing semicolon
    pub fn definition(&self) -> String {
        match self {
            DatabaseObject::Table(o) => render::table::render_create_table(o),
            DatabaseObject::View(o) => render::view::render_create_view(o),
            DatabaseObject::MaterializedView(o) => {
                render::view::render_create_materialized_view(o)
            }
            DatabaseObject::Function(o) => render::function::render_create_function(o),
            DatabaseObject::Procedure(o) => render::function::render_create_procedure(o),
            DatabaseObject::Sequence(o) => render::sequence::render_create_sequence(o),
            DatabaseObject::Index(o) => render::index::render_create_index(o),
            DatabaseObject::Type(o) => render::types::render_create_type(o),
            DatabaseObject::Domain(o) => render::types::render_create_domain(o),
            DatabaseObject::Trigger(o) => render::index::render_create_trigger(o),
            DatabaseObject::Constraint(o) => render::index::render_add_constraint(o),
            DatabaseObject::Extension(o) => render::cluster::render_create_extension(o),
            DatabaseObject::Collation(o) => render::types::render_create_collation(o),
            DatabaseObject::Role(o) => render::cluster::render_create_role(o),
            DatabaseObject::Tablespace(o) => render::cluster::render_create_tablespace(o),
            DatabaseObject::Column(o) => render::table::render_add_column(o),
            DatabaseObject::ForeignTable(o) => render::table::render_create_foreign_table(o),
            DatabaseObject::Partition(o) => render::table::render_create_partition(o),
        }
    }

    /// Objects this one needs to exist first, by schema and name
    pub fn dependencies(&self) -> Vec<ObjectRef> {
        let schema = self.schema();
        match self {
            DatabaseObject::View(o) => o
                .depends_on
                .iter()
                .map(|d| ObjectRef::parse(d, schema))
                .collect(),
            DatabaseObject::MaterializedView(o) => o
                .depends_on
                .iter()
                .map(|d| ObjectRef::parse(d, schema))
                .collect(),
            DatabaseObject::Trigger(o) => vec![
                ObjectRef::new(schema, &o.table_name),
                ObjectRef::parse(&o.function_name, schema),
            ],
            DatabaseObject::Index(o) => vec![ObjectRef::new(schema, &o.table_name)],
            DatabaseObject::Column(o) => vec![ObjectRef::new(schema, &o.table_name)],
            DatabaseObject::Constraint(o) => {
                let mut deps = vec![ObjectRef::new(schema, &o.table_name)];
                if let Some(referenced) = &o.references {
                    deps.push(ObjectRef::parse(referenced, schema));
                }
                deps
            }
            DatabaseObject::Partition(o) => {
                vec![ObjectRef::new(o.parent_schema(), &o.parent_table)]
            }
            _ => Vec::new(),
        }
    }

    /// Copy of this object as it would exist in another database
    pub fn rebased(&self, database: &str) -> DatabaseObject {
        let mut object = self.clone();
        object.identity_mut().database = database.to_string();
        object
    }

    /// Copy of this object relocated to another schema
    pub fn with_schema(&self, schema: &str) -> DatabaseObject {
        let mut object = self.clone();
        if let DatabaseObject::Partition(p) = &mut object
            && p.parent_schema.is_none()
        {
            p.parent_schema = Some(p.identity.schema.clone());
        }
        object.identity_mut().schema = schema.to_string();
        object
    }
}
