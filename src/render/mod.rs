//! DDL rendering for catalog objects and migration steps.

pub mod cluster;
pub mod function;
pub mod index;
pub mod sequence;
pub mod table;
pub mod types;
pub mod view;

use crate::catalog::ObjectIdentity;

/// Always-quoted identifier
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// Words that must be quoted when used as identifiers.
const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "fetch",
    "for", "foreign", "from", "grant", "group", "having", "in", "initially", "intersect", "into",
    "lateral", "leading", "limit", "localtime", "localtimestamp", "not", "null", "offset", "on",
    "only", "or", "order", "placing", "primary", "references", "returning", "select",
    "session_user", "some", "symmetric", "table", "then", "to", "trailing", "true", "union",
    "unique", "user", "using", "variadic", "when", "where", "window", "with",
];

fn is_simple(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        }
        None => false,
    }
}

/// Identifier quoted only when PostgreSQL would otherwise fold or reject it
pub fn ident(name: &str) -> String {
    if is_simple(name) && !RESERVED.contains(&name) {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// Name following a `.`; reserved words are accepted there unquoted
fn label(name: &str) -> String {
    if is_simple(name) {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// `database.schema.name` with each part quoted as needed
pub fn qualified(identity: &ObjectIdentity) -> String {
    format!(
        "{}.{}.{}",
        ident(&identity.database),
        label(&identity.schema),
        label(&identity.name)
    )
}

/// Qualified reference to a sibling relation in the same database and schema
pub fn qualified_relation(identity: &ObjectIdentity, relation: &str) -> String {
    format!(
        "{}.{}.{}",
        ident(&identity.database),
        label(&identity.schema),
        label(relation)
    )
}

/// `"schema"."name"` as used by DROP and ALTER statements
pub fn schema_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Wrap a routine body in a dollar quote whose tag does not occur in the body
pub fn dollar_quote(body: &str) -> String {
    let mut tag = String::from("$$");
    let mut n = 0;
    while body.contains(&tag) {
        tag = if n == 0 {
            "$body$".to_string()
        } else {
            format!("$body{n}$")
        };
        n += 1;
    }
    format!("{tag}{body}{tag}")
}

/// `CREATE OR REPLACE` form of a `CREATE ...` definition
pub fn or_replace(definition: &str) -> String {
    let definition = definition.trim().trim_end_matches(';');
    let Some(rest) = definition
        .get(..7)
        .filter(|head| head.eq_ignore_ascii_case("CREATE "))
        .map(|_| definition[7..].trim_start())
    else {
        return definition.to_string();
    };

    if rest
        .get(..10)
        .is_some_and(|head| head.eq_ignore_ascii_case("OR REPLACE"))
    {
        definition.to_string()
    } else {
        format!("CREATE OR REPLACE {}", rest)
    }
}
