use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

impl Volatility {
    pub fn as_sql(self) -> &'static str {
        match self {
            Volatility::Immutable => "IMMUTABLE",
            Volatility::Stable => "STABLE",
            Volatility::Volatile => "VOLATILE",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "i" => Some(Volatility::Immutable),
            "s" => Some(Volatility::Stable),
            "v" => Some(Volatility::Volatile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    /// Identity signature, e.g. `numeric, numeric`
    #[serde(default)]
    pub arguments: String,
    /// Full parameter list with names and defaults; falls back to `arguments`
    #[serde(default)]
    pub parameters: Option<String>,
    pub return_type: String,
    pub language: String,
    pub body: String,
    #[serde(default)]
    pub volatility: Option<Volatility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub arguments: String,
    #[serde(default)]
    pub parameters: Option<String>,
    pub language: String,
    pub body: String,
}

#[derive(sqlx::FromRow)]
struct RoutineRow {
    schema: String,
    name: String,
    arguments: String,
    parameters: String,
    return_type: Option<String>,
    language: String,
    body: String,
    volatility: String,
}

async fn fetch_rows(conn: &mut PgConnection, prokind: &str) -> Result<Vec<RoutineRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT
            n.nspname::text AS schema,
            p.proname::text AS name,
            pg_get_function_identity_arguments(p.oid) AS arguments,
            pg_get_function_arguments(p.oid) AS parameters,
            CASE WHEN p.prokind = 'f' THEN pg_get_function_result(p.oid) END AS return_type,
            l.lanname::text AS language,
            p.prosrc AS body,
            p.provolatile::text AS volatility
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        JOIN pg_language l ON l.oid = p.prolang
        WHERE p.prokind::text = $1
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg\_toast%'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend dep
              WHERE dep.classid = 'pg_proc'::regclass
                AND dep.objid = p.oid
                AND dep.deptype = 'e'
          )
        ORDER BY n.nspname, p.proname, pg_get_function_identity_arguments(p.oid)
        "#,
    )
    .bind(prokind)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

fn parameters_if_distinct(arguments: &str, parameters: String) -> Option<String> {
    (parameters != arguments).then_some(parameters)
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Function>> {
    info!("Fetching functions...");
    let rows = fetch_rows(conn, "f").await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let parameters = parameters_if_distinct(&row.arguments, row.parameters);
            Function {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                arguments: row.arguments,
                parameters,
                return_type: row.return_type.unwrap_or_else(|| "void".to_string()),
                language: row.language,
                body: row.body,
                volatility: Volatility::from_code(&row.volatility),
            }
        })
        .collect())
}

pub async fn fetch_procedures(conn: &mut PgConnection, database: &str) -> Result<Vec<Procedure>> {
    info!("Fetching procedures...");
    let rows = fetch_rows(conn, "p").await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let parameters = parameters_if_distinct(&row.arguments, row.parameters);
            Procedure {
                identity: ObjectIdentity::new(database, row.schema, row.name),
                arguments: row.arguments,
                parameters,
                language: row.language,
                body: row.body,
            }
        })
        .collect())
}
