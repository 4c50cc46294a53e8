//! Definitions of user-defined types, domains and collations

use crate::catalog::collation::Collation;
use crate::catalog::custom_type::{CustomType, TypeKind};
use crate::catalog::domain::Domain;
use crate::render::{escape_string, ident, qualified};

pub fn render_create_type(custom_type: &CustomType) -> String {
    let body = match &custom_type.definition {
        TypeKind::Enum { labels } => {
            let labels = labels
                .iter()
                .map(|l| escape_string(l))
                .collect::<Vec<_>>()
                .join(", ");
            format!("ENUM ({})", labels)
        }
        TypeKind::Composite { attributes } => {
            let attributes = attributes
                .iter()
                .map(|a| format!("{} {}", ident(&a.name), a.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", attributes)
        }
    };

    format!("CREATE TYPE {} AS {}", qualified(&custom_type.identity), body)
}

pub fn render_create_domain(domain: &Domain) -> String {
    let mut sql = format!(
        "CREATE DOMAIN {} AS {}",
        qualified(&domain.identity),
        domain.base_type
    );

    if let Some(default) = &domain.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    if domain.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(check) = &domain.check_constraint {
        sql.push_str(&format!(" CHECK ({})", check));
    }

    sql
}

pub fn render_create_collation(collation: &Collation) -> String {
    format!(
        "CREATE COLLATION {} (provider = {}, deterministic = {}, lc_collate = {}, lc_ctype = {})",
        qualified(&collation.identity),
        collation.provider,
        collation.is_deterministic,
        escape_string(&collation.collate),
        escape_string(&collation.ctype)
    )
}
