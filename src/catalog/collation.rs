use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collation {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub provider: String,
    #[serde(default = "default_deterministic")]
    pub is_deterministic: bool,
    pub collate: String,
    pub ctype: String,
}

fn default_deterministic() -> bool {
    true
}

#[derive(sqlx::FromRow)]
struct CollationRow {
    schema: String,
    name: String,
    provider: String,
    is_deterministic: bool,
    collate: String,
    ctype: String,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Collation>> {
    info!("Fetching collations...");
    let rows: Vec<CollationRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.collname::text AS name,
            CASE c.collprovider
                WHEN 'i' THEN 'icu'
                WHEN 'c' THEN 'libc'
                WHEN 'b' THEN 'builtin'
                ELSE 'default'
            END AS provider,
            c.collisdeterministic AS is_deterministic,
            COALESCE(c.collcollate, '') AS collate,
            COALESCE(c.collctype, '') AS ctype
        FROM pg_collation c
        JOIN pg_namespace n ON n.oid = c.collnamespace
        WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_collation'::regclass
                AND dep.objid = c.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, c.collname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Collation {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            provider: row.provider,
            is_deterministic: row.is_deterministic,
            collate: row.collate,
            ctype: row.ctype,
        })
        .collect())
}
