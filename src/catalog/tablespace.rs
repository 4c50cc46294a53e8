use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tablespace {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub owner: String,
    pub location: String,
}

#[derive(sqlx::FromRow)]
struct TablespaceRow {
    name: String,
    owner: String,
    location: String,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Tablespace>> {
    info!("Fetching tablespaces...");
    let rows: Vec<TablespaceRow> = sqlx::query_as(
        r#"
        SELECT
            t.spcname::text AS name,
            pg_get_userbyid(t.spcowner)::text AS owner,
            pg_tablespace_location(t.oid) AS location
        FROM pg_tablespace t
        WHERE t.spcname NOT IN ('pg_default', 'pg_global')
        ORDER BY t.spcname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Tablespace {
            identity: ObjectIdentity::new(database, "", row.name),
            owner: row.owner,
            location: row.location,
        })
        .collect())
}
