use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

/// A partition attached to a partitioned table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    /// Defaults to the partition's own schema when omitted
    #[serde(default)]
    pub parent_schema: Option<String>,
    pub parent_table: String,
    /// Bound clause, e.g. `FOR VALUES FROM ('2024-01-01') TO ('2024-02-01')`
    pub bound: String,
}

impl Partition {
    pub fn parent_schema(&self) -> &str {
        self.parent_schema
            .as_deref()
            .unwrap_or(&self.identity.schema)
    }
}

#[derive(sqlx::FromRow)]
struct PartitionRow {
    schema: String,
    name: String,
    parent_schema: String,
    parent_table: String,
    bound: String,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Partition>> {
    info!("Fetching partitions...");
    let rows: Vec<PartitionRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS name,
            pn.nspname::text AS parent_schema,
            pc.relname::text AS parent_table,
            pg_get_expr(c.relpartbound, c.oid) AS bound
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_inherits i ON i.inhrelid = c.oid
        JOIN pg_class pc ON pc.oid = i.inhparent
        JOIN pg_namespace pn ON pn.oid = pc.relnamespace
        WHERE c.relispartition
          AND c.relkind IN ('r', 'p')
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
        ORDER BY n.nspname, c.relname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let parent_schema = (row.parent_schema != row.schema).then_some(row.parent_schema);
            Partition {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                parent_schema,
                parent_table: row.parent_table,
                bound: row.bound,
            }
        })
        .collect())
}
