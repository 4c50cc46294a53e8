use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

use crate::catalog::id::ObjectIdentity;
use crate::error::Result;

/// A cluster-wide role; `identity.schema` is empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(flatten)]
    pub identity: ObjectIdentity,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub can_create_databases: bool,
    #[serde(default)]
    pub can_create_roles: bool,
    #[serde(default)]
    pub can_login: bool,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    name: String,
    is_superuser: bool,
    can_create_databases: bool,
    can_create_roles: bool,
    can_login: bool,
}

pub async fn fetch(conn: &mut PgConnection, database: &str) -> Result<Vec<Role>> {
    info!("Fetching roles...");
    let rows: Vec<RoleRow> = sqlx::query_as(
        r#"
        SELECT
            r.rolname::text AS name,
            r.rolsuper AS is_superuser,
            r.rolcreatedb AS can_create_databases,
            r.rolcreaterole AS can_create_roles,
            r.rolcanlogin AS can_login
        FROM pg_roles r
        WHERE r.rolname NOT LIKE 'pg\_%'
        ORDER BY r.rolname
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Role {
            identity: ObjectIdentity::new(database, "", row.name),
            is_superuser: row.is_superuser,
            can_create_databases: row.can_create_databases,
            can_create_roles: row.can_create_roles,
            can_login: row.can_login,
        })
        .collect())
}
