use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct SequenceOptions {
    pub data_type: String,
    pub start_value: i64,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub cache: i64,
    pub cycle: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            data_type: "bigint".to_string(),
            start_value: 1,
            increment: 1,
            min_value: 1,
            max_value: i64::MAX,
            cache: 1,
            cycle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(flatten)]
    pub options: SequenceOptions,
}

#[derive(sqlx::FromRow)]
struct SequenceRow {
    schema: String,
    name: String,
    #[sqlx(flatten)]
    options: SequenceOptions,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Sequence>> {
    info!("Fetching sequences...");
    let rows: Vec<SequenceRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS name,
            format_type(s.seqtypid, NULL) AS data_type,
            s.seqstart AS start_value,
            s.seqincrement AS increment,
            s.seqmin AS min_value,
            s.seqmax AS max_value,
            s.seqcache AS cache,
            s.seqcycle AS cycle
        FROM pg_sequence s
        JOIN pg_class c ON c.oid = s.seqrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          -- identity sequences are recreated with their column
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_class'::regclass
                AND dep.objid = c.oid
                AND dep.deptype IN ('i', 'e')
          )
        ORDER BY n.nspname, c.relname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Sequence {
            identity: ObjectIdentity::new(database, row.schema, row.name),
            options: row.options,
        })
        .collect())
}
