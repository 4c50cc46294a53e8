use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

/// Represents a PostgreSQL extension; `identity.schema` is where its objects live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub ext_version: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ExtensionRow {
    name: String,
    schema: String,
    version: String,
}

/// Fetch all extensions from the database
pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Extension>> {
    info!("Fetching extensions...");
    let rows: Vec<ExtensionRow> = sqlx::query_as(
        r#"
        SELECT
            e.extname::text AS name,
            n.nspname::text AS schema,
            e.extversion AS version
        FROM pg_extension e
        JOIN pg_namespace n ON e.extnamespace = n.oid
        -- Exclude built-in extensions that come with PostgreSQL
        WHERE e.extname NOT IN ('plpgsql')
        ORDER BY e.extname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Extension {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            ext_version: Some(row.version),
        })
        .collect())
}
