use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeAttribute {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Enum { labels: Vec<String> },
    Composite { attributes: Vec<CompositeAttribute> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomType {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub definition: TypeKind,
}

#[derive(sqlx::FromRow)]
struct TypeRow {
    schema: String,
    name: String,
    kind: String,
    labels: Vec<String>,
    attribute_names: Vec<String>,
    attribute_types: Vec<String>,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<CustomType>> {
    info!("Fetching custom types...");
    let rows: Vec<TypeRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            t.typname::text AS name,
            t.typtype::text AS kind,
            ARRAY(
                SELECT e.enumlabel::text FROM pg_enum e
                WHERE e.enumtypid = t.oid
                ORDER BY e.enumsortorder
            ) AS labels,
            ARRAY(
                SELECT a.attname::text FROM pg_attribute a
                WHERE a.attrelid = t.typrelid AND a.attnum > 0 AND NOT a.attisdropped
                ORDER BY a.attnum
            ) AS attribute_names,
            ARRAY(
                SELECT format_type(a.atttypid, a.atttypmod) FROM pg_attribute a
                WHERE a.attrelid = t.typrelid AND a.attnum > 0 AND NOT a.attisdropped
                ORDER BY a.attnum
            ) AS attribute_types
        FROM pg_type t
        JOIN pg_namespace n ON n.oid = t.typnamespace
        LEFT JOIN pg_class c ON c.oid = t.typrelid
        WHERE (t.typtype = 'e' OR (t.typtype = 'c' AND c.relkind = 'c'))
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_type'::regclass
                AND dep.objid = t.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, t.typname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let definition = if row.kind == "e" {
                TypeKind::Enum { labels: row.labels }
            } else {
                TypeKind::Composite {
                    attributes: row
                        .attribute_names
                        .into_iter()
                        .zip(row.attribute_types)
                        .map(|(name, data_type)| CompositeAttribute { name, data_type })
                        .collect(),
                }
            };
            CustomType {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                definition,
            }
        })
        .collect())
}
