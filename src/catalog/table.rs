use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use std::collections::BTreeMap;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable,
            default: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Partition key (`RANGE (created_at)`) for partitioned tables
    #[serde(default)]
    pub partition_by: Option<String>,
}

impl Table {
    pub fn new(identity: ObjectIdentity, columns: Vec<Column>) -> Self {
        Self {
            identity,
            columns,
            partition_by: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A column tracked as an object of its own rather than inside its table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub table_name: String,
    pub data_type: String,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl TableColumn {
    pub fn as_column(&self) -> Column {
        Column {
            name: self.identity.name.clone(),
            data_type: self.data_type.clone(),
            is_nullable: self.is_nullable,
            default: self.default.clone(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TableRow {
    schema: String,
    name: String,
    partition_by: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    schema: String,
    table_name: String,
    name: String,
    data_type: String,
    is_nullable: bool,
    column_default: Option<String>,
}

/// Fetch columns of every relation of the given kinds, keyed by (schema, relation)
pub(crate) async fn fetch_columns(
    conn: &mut PgConnection,
    relkinds: &[&str],
) -> Result<BTreeMap<(String, String), Vec<Column>>> {
    let relkinds: Vec<String> = relkinds.iter().map(|k| k.to_string()).collect();
    let rows: Vec<ColumnRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS table_name,
            a.attname::text AS name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            NOT a.attnotnull AS is_nullable,
            pg_get_expr(ad.adbin, ad.adrelid) AS column_default
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
        WHERE a.attnum > 0
          AND NOT a.attisdropped
          AND c.relkind::text = ANY($1)
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND n.nspname NOT LIKE 'pg\_temp\_%'
        ORDER BY n.nspname, c.relname, a.attnum
        "#,
    )
    .bind(relkinds)
    .fetch_all(&mut *conn)
    .await?;

    let mut columns = BTreeMap::new();
    for ((schema, table), rows) in &rows
        .into_iter()
        .chunk_by(|r| (r.schema.clone(), r.table_name.clone()))
    {
        let cols = rows
            .map(|r| Column {
                name: r.name,
                data_type: r.data_type,
                is_nullable: r.is_nullable,
                default: r.column_default,
            })
            .collect();
        columns.insert((schema, table), cols);
    }

    Ok(columns)
}

/// Fetch all ordinary and partitioned tables (partitions themselves are fetched separately)
pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Table>> {
    info!("Fetching tables...");
    let rows: Vec<TableRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS name,
            CASE WHEN c.relkind = 'p' THEN pg_get_partkeydef(c.oid) END AS partition_by
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p')
          AND NOT c.relispartition
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND n.nspname NOT LIKE 'pg\_temp\_%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_class'::regclass
                AND dep.objid = c.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, c.relname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut columns = fetch_columns(conn, &["r", "p"]).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let cols = columns
                .remove(&(row.schema.clone(), row.name.clone()))
                .unwrap_or_default();
            Table {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                columns: cols,
                partition_by: row.partition_by,
            }
        })
        .collect())
}
