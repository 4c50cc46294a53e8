use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn as_sql(self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD OF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

impl TriggerEvent {
    pub fn as_sql(self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
            TriggerEvent::Truncate => "TRUNCATE",
        }
    }
}

/// A trigger on a table; its schema is the table's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    pub table_name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    #[serde(default)]
    pub for_each_row: bool,
    /// Trigger function, schema-qualified (`app.audit_fn`)
    pub function_name: String,
    #[serde(default)]
    pub when: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TriggerRow {
    schema: String,
    table_name: String,
    name: String,
    tgtype: i32,
    function_name: String,
    when_condition: Option<String>,
}

// Bits of pg_trigger.tgtype
const TRIGGER_TYPE_ROW: i32 = 1 << 0;
const TRIGGER_TYPE_BEFORE: i32 = 1 << 1;
const TRIGGER_TYPE_INSERT: i32 = 1 << 2;
const TRIGGER_TYPE_DELETE: i32 = 1 << 3;
const TRIGGER_TYPE_UPDATE: i32 = 1 << 4;
const TRIGGER_TYPE_TRUNCATE: i32 = 1 << 5;
const TRIGGER_TYPE_INSTEAD: i32 = 1 << 6;

fn decode_tgtype(tgtype: i32) -> (TriggerTiming, Vec<TriggerEvent>, bool) {
    let timing = if tgtype & TRIGGER_TYPE_BEFORE != 0 {
        TriggerTiming::Before
    } else if tgtype & TRIGGER_TYPE_INSTEAD != 0 {
        TriggerTiming::InsteadOf
    } else {
        TriggerTiming::After
    };

    let events = [
        (TRIGGER_TYPE_INSERT, TriggerEvent::Insert),
        (TRIGGER_TYPE_UPDATE, TriggerEvent::Update),
        (TRIGGER_TYPE_DELETE, TriggerEvent::Delete),
        (TRIGGER_TYPE_TRUNCATE, TriggerEvent::Truncate),
    ]
    .into_iter()
    .filter(|(bit, _)| tgtype & bit != 0)
    .map(|(_, event)| event)
    .collect();

    (timing, events, tgtype & TRIGGER_TYPE_ROW != 0)
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Trigger>> {
    info!("Fetching triggers...");
    let rows: Vec<TriggerRow> = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS table_name,
            t.tgname::text AS name,
            t.tgtype::int AS tgtype,
            fn.nspname || '.' || p.proname AS function_name,
            substring(pg_get_triggerdef(t.oid, true) FROM 'WHEN \((.*)\) EXECUTE') AS when_condition
        FROM pg_trigger t
        JOIN pg_class c ON c.oid = t.tgrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_proc p ON p.oid = t.tgfoid
        JOIN pg_namespace fn ON fn.oid = p.pronamespace
        WHERE NOT t.tgisinternal
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
        ORDER BY n.nspname, c.relname, t.tgname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (timing, events, for_each_row) = decode_tgtype(row.tgtype);
            Trigger {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                table_name: row.table_name,
                timing,
                events,
                for_each_row,
                function_name: row.function_name,
                when: row.when_condition,
            }
        })
        .collect())
}
