use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

fn default_method() -> String {
    "btree".to_string()
}

/// A stand-alone index; indexes backing primary key, unique and exclusion
/// constraints belong to the constraint instead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub table_name: String,
    /// Key columns or expressions, in order
    pub columns: Vec<String>,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub predicate: Option<String>,
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    schema: String,
    name: String,
    table_name: String,
    columns: Vec<String>,
    method: String,
    is_unique: bool,
    predicate: Option<String>,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Index>> {
    info!("Fetching indexes...");
    let rows: Vec<IndexRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            ic.relname::text AS name,
            tc.relname::text AS table_name,
            ARRAY(
                SELECT pg_get_indexdef(i.indexrelid, k, true)
                FROM generate_series(1, i.indnkeyatts::int) AS k
                ORDER BY k
            )::text[] AS columns,
            am.amname::text AS method,
            i.indisunique AS is_unique,
            pg_get_expr(i.indpred, i.indrelid) AS predicate
        FROM pg_index i
        JOIN pg_class ic ON ic.oid = i.indexrelid
        JOIN pg_class tc ON tc.oid = i.indrelid
        JOIN pg_namespace n ON n.oid = tc.relnamespace
        JOIN pg_am am ON am.oid = ic.relam
        WHERE tc.relkind IN ('r', 'p', 'm')
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_constraint con
              WHERE con.conindid = i.indexrelid
                AND con.contype IN ('p', 'u', 'x')
          )
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_class'::regclass
                AND dep.objid = tc.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, tc.relname, ic.relname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Index {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            table_name: row.table_name,
            columns: row.columns,
            method: row.method,
            is_unique: row.is_unique,
            predicate: row.predicate,
        })
        .collect())
}
