use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use std::collections::BTreeMap;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::catalog::table::{Column, fetch_columns};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTable {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub columns: Vec<Column>,
    pub server: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(sqlx::FromRow)]
struct ForeignTableRow {
    schema: String,
    name: String,
    server: String,
    options: Vec<String>,
}

/// Split `key=value` option strings as stored in `ftoptions`
fn parse_options(raw: Vec<String>) -> BTreeMap<String, String> {
    raw.into_iter()
        .filter_map(|opt| {
            opt.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<ForeignTable>> {
    info!("Fetching foreign tables...");
    let rows: Vec<ForeignTableRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS name,
            s.srvname::text AS server,
            COALESCE(ft.ftoptions, '{}')::text[] AS options
        FROM pg_foreign_table ft
        JOIN pg_class c ON c.oid = ft.ftrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_foreign_server s ON s.oid = ft.ftserver
        WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')
        ORDER BY n.nspname, c.relname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut columns = fetch_columns(conn, &["f"]).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let cols = columns
                .remove(&(row.schema.clone(), row.name.clone()))
                .unwrap_or_default();
            ForeignTable {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                columns: cols,
                server: row.server,
                options: parse_options(row.options),
            }
        })
        .collect())
}
