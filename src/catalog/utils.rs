/// Helper to check if a schema name is a system schema.
pub fn is_system_schema(schema: &str) -> bool {
    matches!(schema, "pg_catalog" | "information_schema" | "pg_toast")
        || schema.starts_with("pg_temp_")
        || schema.starts_with("pg_toast_temp_")
}

/// Split `schema.name` into its parts; a bare name gets `default_schema`
pub fn split_qualified<'a>(reference: &'a str, default_schema: &'a str) -> (&'a str, &'a str) {
    match reference.rsplit_once('.') {
        Some((schema, name)) => (schema.rsplit('.').next().unwrap_or(schema), name),
        None => (default_schema, reference),
    }
}
