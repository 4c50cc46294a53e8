use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of schema object, in the order objects are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Role,
    Tablespace,
    Extension,
    Collation,
    Type,
    Domain,
    Sequence,
    Table,
    ForeignTable,
    Partition,
    Column,
    Constraint,
    Index,
    Function,
    Procedure,
    View,
    MaterializedView,
    Trigger,
}

impl ObjectType {
    pub const ALL: [ObjectType; 18] = [
        ObjectType::Role,
        ObjectType::Tablespace,
        ObjectType::Extension,
        ObjectType::Collation,
        ObjectType::Type,
        ObjectType::Domain,
        ObjectType::Sequence,
        ObjectType::Table,
        ObjectType::ForeignTable,
        ObjectType::Partition,
        ObjectType::Column,
        ObjectType::Constraint,
        ObjectType::Index,
        ObjectType::Function,
        ObjectType::Procedure,
        ObjectType::View,
        ObjectType::MaterializedView,
        ObjectType::Trigger,
    ];

    /// Position when creating objects: dependencies come first.
    pub fn create_rank(self) -> usize {
        self as usize
    }

    /// Position when dropping objects: dependents go first.
    pub fn drop_rank(self) -> usize {
        match self {
            ObjectType::Trigger => 0,
            ObjectType::Constraint => 1,
            ObjectType::Index => 2,
            ObjectType::MaterializedView => 3,
            ObjectType::View => 4,
            ObjectType::Procedure => 5,
            ObjectType::Function => 6,
            ObjectType::Column => 7,
            ObjectType::Partition => 8,
            ObjectType::ForeignTable => 9,
            ObjectType::Table => 10,
            ObjectType::Sequence => 11,
            ObjectType::Domain => 12,
            ObjectType::Type => 13,
            ObjectType::Collation => 14,
            ObjectType::Extension => 15,
            ObjectType::Tablespace => 16,
            ObjectType::Role => 17,
        }
    }

    /// SQL keyword used in DROP / ALTER ... SET SCHEMA statements
    pub fn keyword(self) -> &'static str {
        match self {
            ObjectType::Role => "ROLE",
            ObjectType::Tablespace => "TABLESPACE",
            ObjectType::Extension => "EXTENSION",
            ObjectType::Collation => "COLLATION",
            ObjectType::Type => "TYPE",
            ObjectType::Domain => "DOMAIN",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::Table | ObjectType::Partition => "TABLE",
            ObjectType::ForeignTable => "FOREIGN TABLE",
            ObjectType::Column => "COLUMN",
            ObjectType::Constraint => "CONSTRAINT",
            ObjectType::Index => "INDEX",
            ObjectType::Function => "FUNCTION",
            ObjectType::Procedure => "PROCEDURE",
            ObjectType::View => "VIEW",
            ObjectType::MaterializedView => "MATERIALIZED VIEW",
            ObjectType::Trigger => "TRIGGER",
        }
    }

    /// Objects that live on a table and are addressed through it
    pub fn is_table_scoped(self) -> bool {
        matches!(
            self,
            ObjectType::Column | ObjectType::Constraint | ObjectType::Trigger | ObjectType::Index
        )
    }

    /// Objects whose identity includes a parameter signature
    pub fn is_routine(self) -> bool {
        matches!(self, ObjectType::Function | ObjectType::Procedure)
    }

    /// Cluster-wide or database-wide objects that PostgreSQL never schema-qualifies
    pub fn is_schema_less(self) -> bool {
        matches!(
            self,
            ObjectType::Role | ObjectType::Tablespace | ObjectType::Extension
        )
    }

    /// Objects that hold rows (or sequence state) which a DROP discards
    pub fn holds_data(self) -> bool {
        matches!(
            self,
            ObjectType::Table
                | ObjectType::ForeignTable
                | ObjectType::Partition
                | ObjectType::Column
                | ObjectType::Sequence
        )
    }

    /// Objects that `ALTER ... SET SCHEMA` can relocate on their own
    pub fn supports_set_schema(self) -> bool {
        matches!(
            self,
            ObjectType::Table
                | ObjectType::ForeignTable
                | ObjectType::Partition
                | ObjectType::View
                | ObjectType::MaterializedView
                | ObjectType::Function
                | ObjectType::Procedure
                | ObjectType::Sequence
                | ObjectType::Type
                | ObjectType::Domain
                | ObjectType::Collation
                | ObjectType::Extension
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Role => "role",
            ObjectType::Tablespace => "tablespace",
            ObjectType::Extension => "extension",
            ObjectType::Collation => "collation",
            ObjectType::Type => "type",
            ObjectType::Domain => "domain",
            ObjectType::Sequence => "sequence",
            ObjectType::Table => "table",
            ObjectType::ForeignTable => "foreign table",
            ObjectType::Partition => "partition",
            ObjectType::Column => "column",
            ObjectType::Constraint => "constraint",
            ObjectType::Index => "index",
            ObjectType::Function => "function",
            ObjectType::Procedure => "procedure",
            ObjectType::View => "view",
            ObjectType::MaterializedView => "materialized view",
            ObjectType::Trigger => "trigger",
        };
        f.write_str(name)
    }
}

/// Name, schema and database of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentity {
    pub name: String,
    pub schema: String,
    pub database: String,
}

impl ObjectIdentity {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            database: database.into(),
        }
    }

    /// `database.schema.name`, case preserved
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.name)
    }
}

/// Key an object is matched on when two snapshots are compared.
///
/// `qualifier` disambiguates objects sharing a name: the parent table for
/// table-scoped objects and the parameter signature for routines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub object_type: ObjectType,
    pub schema: String,
    pub name: String,
    pub qualifier: Option<String>,
}

impl ObjectKey {
    /// Same key with case folded, for case-insensitive matching
    pub fn folded(&self) -> Self {
        Self {
            object_type: self.object_type,
            schema: self.schema.to_lowercase(),
            name: self.name.to_lowercase(),
            qualifier: self.qualifier.as_ref().map(|q| q.to_lowercase()),
        }
    }

    /// Key without the schema, used to pair up objects that moved schema
    pub fn without_schema(&self) -> (ObjectType, String, Option<String>) {
        (self.object_type, self.name.clone(), self.qualifier.clone())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.qualifier, self.object_type) {
            (Some(q), t) if t.is_routine() => {
                write!(f, "{t} {}.{}({q})", self.schema, self.name)
            }
            (Some(q), t) => write!(f, "{t} {}.{}.{}", self.schema, q, self.name),
            (None, t) => write!(f, "{t} {}.{}", self.schema, self.name),
        }
    }
}
