use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub base_type: String,
    /// Check expression without the surrounding `CHECK (...)`
    #[serde(default)]
    pub check_constraint: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub not_null: bool,
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    schema: String,
    name: String,
    base_type: String,
    check_constraint: Option<String>,
    default_value: Option<String>,
    not_null: bool,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Domain>> {
    info!("Fetching domains...");
    let rows: Vec<DomainRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            t.typname::text AS name,
            format_type(t.typbasetype, t.typtypmod) AS base_type,
            (
                SELECT regexp_replace(pg_get_constraintdef(c.oid, true), '^CHECK \((.*)\)$', '\1')
                FROM pg_constraint c
                WHERE c.contypid = t.oid AND c.contype = 'c'
                ORDER BY c.conname
                LIMIT 1
            ) AS check_constraint,
            t.typdefault AS default_value,
            t.typnotnull AS not_null
        FROM pg_type t
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE t.typtype = 'd'
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
        .map(|row| Domain {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            base_type: row.base_type,
            check_constraint: row.check_constraint,
            default: row.default_value,
            not_null: row.not_null,
        })
        .collect())
}
