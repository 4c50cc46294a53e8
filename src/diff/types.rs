//! Comparison results: differences, their typed details and metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::catalog::table::Column;
use crate::catalog::{DatabaseObject, ObjectType};

/// Metadata keys attached to differences
pub mod meta {
    pub const TABLE_NAME: &str = "TableName";
    pub const SIGNATURE: &str = "Signature";
    pub const SOURCE_SCHEMA: &str = "SourceSchema";
    pub const TARGET_SCHEMA: &str = "TargetSchema";
    pub const QUALIFIED_NAME: &str = "QualifiedName";
    pub const DATABASE: &str = "Database";
    pub const PARENT_TABLE: &str = "ParentTable";
    pub const EXT_VERSION: &str = "ExtVersion";
    pub const IS_SUPERUSER: &str = "IsSuperuser";
    pub const CAN_CREATE_DATABASES: &str = "CanCreateDatabases";
    pub const CAN_CREATE_ROLES: &str = "CanCreateRoles";
    pub const CAN_LOGIN: &str = "CanLogin";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiffType {
    Added,
    Removed,
    Modified,
    Moved,
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiffType::Added => "added",
            DiffType::Removed => "removed",
            DiffType::Modified => "modified",
            DiffType::Moved => "moved",
        };
        f.write_str(s)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Definitions must match exactly
    #[default]
    Strict,
    /// Whitespace, formatting and keyword case are ignored
    Lenient,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Glob patterns of schemas to leave out
    pub ignore_schemas: Vec<String>,
    pub include_system_objects: bool,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// Applying the change discards data
    DataLoss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailKind {
    ColumnAdded {
        column: Column,
    },
    ColumnRemoved {
        column: Column,
    },
    ColumnTypeChanged {
        column: String,
        from: String,
        to: String,
    },
    NullabilityChanged {
        column: String,
        from_nullable: bool,
        to_nullable: bool,
    },
    DefaultChanged {
        column: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Column order differs; ALTER TABLE cannot reproduce it
    ColumnOrderChanged,
    DefinitionChanged {
        /// Unified line diff of source and target definitions
        diff: String,
    },
    AttributeChanged {
        attribute: String,
        from: String,
        to: String,
    },
    /// Object exists only in the source and is dropped
    ObjectDropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferenceDetail {
    #[serde(flatten)]
    pub kind: DetailKind,
    pub description: String,
    pub risk: RiskLevel,
}

impl DifferenceDetail {
    pub fn new(kind: DetailKind, description: impl Into<String>, risk: RiskLevel) -> Self {
        Self {
            kind,
            description: description.into(),
            risk,
        }
    }

    pub fn data_loss(kind: DetailKind, description: impl Into<String>) -> Self {
        Self::new(kind, description, RiskLevel::DataLoss)
    }

    pub fn is_data_loss(&self) -> bool {
        self.risk == RiskLevel::DataLoss
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDifference {
    pub diff_type: DiffType,
    pub object_type: ObjectType,
    pub object_name: String,
    pub schema: String,
    pub source_definition: Option<String>,
    pub target_definition: Option<String>,
    #[serde(default)]
    pub details: Vec<DifferenceDetail>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Object as it exists in the source snapshot
    #[serde(default)]
    pub source: Option<DatabaseObject>,
    /// Object as it exists in the target snapshot
    #[serde(default)]
    pub target: Option<DatabaseObject>,
    /// Unchanged objects that need this one, directly or through each
    /// other; recreating the object means recreating these too
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<DatabaseObject>,
}

impl SchemaDifference {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn metadata_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    pub fn has_data_loss(&self) -> bool {
        self.details.iter().any(DifferenceDetail::is_data_loss)
    }

    pub fn risk(&self) -> RiskLevel {
        self.details
            .iter()
            .map(|d| d.risk)
            .max()
            .unwrap_or(RiskLevel::Low)
    }

    /// Human-readable handle, e.g. `trigger app.audit_changes on transactions`
    pub fn label(&self) -> String {
        let name = if self.schema.is_empty() || self.object_type.is_schema_less() {
            self.object_name.clone()
        } else {
            format!("{}.{}", self.schema, self.object_name)
        };

        match (
            self.metadata_str(meta::TABLE_NAME),
            self.metadata_str(meta::SIGNATURE),
        ) {
            (Some(table), _) if self.object_type.is_table_scoped() => {
                format!("{} {} on {}", self.object_type, name, table)
            }
            (_, Some(signature)) if self.object_type.is_routine() => {
                format!("{} {}({})", self.object_type, name, signature)
            }
            _ => format!("{} {}", self.object_type, name),
        }
    }
}

/// Where a snapshot came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// File path or masked connection string
    pub label: String,
    pub database: String,
    pub object_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub moved: usize,
    pub data_loss: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.moved
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaComparison {
    pub id: Uuid,
    pub source: SnapshotInfo,
    pub target: SnapshotInfo,
    pub differences: Vec<SchemaDifference>,
    pub mode: ComparisonMode,
    pub compared_at: DateTime<Utc>,
}

impl SchemaComparison {
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for diff in &self.differences {
            match diff.diff_type {
                DiffType::Added => summary.added += 1,
                DiffType::Removed => summary.removed += 1,
                DiffType::Modified => summary.modified += 1,
                DiffType::Moved => summary.moved += 1,
            }
            if diff.has_data_loss() {
                summary.data_loss += 1;
            }
        }
        summary
    }

    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
    }
}
