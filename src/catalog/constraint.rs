use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Exclusion,
}

impl ConstraintKind {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "p" => Some(ConstraintKind::PrimaryKey),
            "u" => Some(ConstraintKind::Unique),
            "f" => Some(ConstraintKind::ForeignKey),
            "c" => Some(ConstraintKind::Check),
            "x" => Some(ConstraintKind::Exclusion),
            _ => None,
        }
    }
}

/// A table constraint; `definition` is the text after `ADD CONSTRAINT name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub table_name: String,
    pub kind: ConstraintKind,
    pub definition: String,
    /// Referenced table of a foreign key, as `schema.table`
    #[serde(default)]
    pub references: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ConstraintRow {
    schema: String,
    table_name: String,
    name: String,
    kind: String,
    definition: String,
    references: Option<String>,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Constraint>> {
    info!("Fetching constraints...");
    let rows: Vec<ConstraintRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS table_name,
            con.conname::text AS name,
            con.contype::text AS kind,
            pg_get_constraintdef(con.oid, true) AS definition,
            CASE WHEN con.contype = 'f' THEN fn.nspname || '.' || fc.relname END AS "references"
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_class fc ON fc.oid = con.confrelid
        LEFT JOIN pg_namespace fn ON fn.oid = fc.relnamespace
        WHERE con.contype IN ('p', 'u', 'f', 'c', 'x')
          AND con.conislocal
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_class'::regclass
                AND dep.objid = c.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, c.relname, con.conname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let kind = ConstraintKind::from_code(&row.kind)?;
            Some(Constraint {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                table_name: row.table_name,
                kind,
                definition: row.definition,
                references: row.references,
            })
        })
        .collect())
}
