//! Definitions of objects PostgreSQL never schema-qualifies: roles,
//! tablespaces and extensions

use crate::catalog::extension::Extension;
use crate::catalog::role::Role;
use crate::catalog::tablespace::Tablespace;
use crate::render::{escape_string, ident, quote_ident};

pub fn render_create_extension(extension: &Extension) -> String {
    let mut sql = format!(
        "CREATE EXTENSION IF NOT EXISTS {}",
        quote_ident(&extension.identity.name)
    );
    if let Some(version) = &extension.ext_version {
        sql.push_str(&format!(" VERSION {}", escape_string(version)));
    }
    sql
}

/// Every attribute flag, positive or negated
pub fn role_options(role: &Role) -> String {
    let flag = |set: bool, name: &str| {
        if set {
            name.to_string()
        } else {
            format!("NO{}", name)
        }
    };

    [
        flag(role.is_superuser, "SUPERUSER"),
        flag(role.can_create_databases, "CREATEDB"),
        flag(role.can_create_roles, "CREATEROLE"),
        flag(role.can_login, "LOGIN"),
    ]
    .join(" ")
}

pub fn render_create_role(role: &Role) -> String {
    format!(
        "CREATE ROLE {} WITH {}",
        ident(&role.identity.name),
        role_options(role)
    )
}

pub fn render_create_tablespace(tablespace: &Tablespace) -> String {
    format!(
        "CREATE TABLESPACE {} OWNER {} LOCATION {}",
        ident(&tablespace.identity.name),
        ident(&tablespace.owner),
        escape_string(&tablespace.location)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ObjectIdentity;

    #[test]
    fn test_render_extension() {
        let mut extension = Extension {
            identity: ObjectIdentity::new("app", "public", "pgcrypto"),
            ext_version: Some("1.3".to_string()),
        };
        assert_eq!(
            render_create_extension(&extension),
            "CREATE EXTENSION IF NOT EXISTS \"pgcrypto\" VERSION '1.3'"
        );

        extension.ext_version = None;
        assert_eq!(
            render_create_extension(&extension),
            "CREATE EXTENSION IF NOT EXISTS \"pgcrypto\""
        );
    }

    #[test]
    fn test_render_role_renders_every_flag() {
        let role = Role {
            identity: ObjectIdentity::new("app", "", "reporting"),
            is_superuser: false,
            can_create_databases: true,
            can_create_roles: false,
            can_login: true,
        };

        assert_eq!(
            render_create_role(&role),
            "CREATE ROLE reporting WITH NOSUPERUSER CREATEDB NOCREATEROLE LOGIN"
        );
    }

    #[test]
    fn test_render_tablespace() {
        let tablespace = Tablespace {
            identity: ObjectIdentity::new("app", "", "fast_ssd"),
            owner: "postgres".to_string(),
            location: "/mnt/ssd/pg".to_string(),
        };

        assert_eq!(
            render_create_tablespace(&tablespace),
            "CREATE TABLESPACE fast_ssd OWNER postgres LOCATION '/mnt/ssd/pg'"
        );
    }
}
