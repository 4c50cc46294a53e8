use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub query: String,
    /// Relations the query reads from, as `schema.name`
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedView {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub query: String,
    #[serde(default = "default_with_data")]
    pub with_data: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_with_data() -> bool {
    true
}

#[derive(sqlx::FromRow)]
struct ViewRow {
    schema: String,
    name: String,
    query: String,
    with_data: bool,
    depends_on: Vec<String>,
}

async fn fetch_rows(conn: &mut PgConnection, relkind: &str) -> Result<Vec<ViewRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS name,
            pg_get_viewdef(c.oid, true) AS query,
            c.relispopulated AS with_data,
            COALESCE(
                array_agg(DISTINCT dn.nspname || '.' || dc.relname)
                    FILTER (WHERE dc.oid IS NOT NULL AND dc.oid <> c.oid),
                '{}'
            )::text[] AS depends_on
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_rewrite r ON r.ev_class = c.oid
        LEFT JOIN pg_depend d
            ON d.classid = 'pg_rewrite'::regclass
           AND d.objid = r.oid
           AND d.refclassid = 'pg_class'::regclass
        LEFT JOIN pg_class dc ON dc.oid = d.refobjid
        LEFT JOIN pg_namespace dn ON dn.oid = dc.relnamespace
        WHERE c.relkind::text = $1
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend ext
              WHERE ext.classid = 'pg_class'::regclass
                AND ext.objid = c.oid
                AND ext.deptype = 'e'
          )
        GROUP BY n.nspname, c.relname, c.oid, c.relispopulated
        ORDER BY n.nspname, c.relname
        "#,
    )
    .bind(relkind)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<View>> {
    info!("Fetching views...");
    let rows = fetch_rows(conn, "v").await?;

    Ok(rows
        .into_iter()
        .map(|row| View {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            query: row.query,
            depends_on: row.depends_on,
        })
        .collect())
}

pub async fn fetch_materialized(
    conn: &mut PgConnection,
    database: &str,
) -> Result<Vec<MaterializedView>> {
    info!("Fetching materialized views...");
    let rows = fetch_rows(conn, "m").await?;

    Ok(rows
        .into_iter()
        .map(|row| MaterializedView {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            query: row.query,
            with_data: row.with_data,
            depends_on: row.depends_on,
        })
        .collect())
}
