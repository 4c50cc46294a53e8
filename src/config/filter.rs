use crate::catalog::DatabaseObject;
use crate::catalog::utils::is_system_schema;
use glob::Pattern;
use tracing::warn;

/// Decides which snapshot objects take part in a comparison
pub struct ObjectFilter {
    ignore_schemas: Vec<Pattern>,
    include_system_objects: bool,
}

impl ObjectFilter {
    pub fn new(ignore_schemas: &[String], include_system_objects: bool) -> Self {
        let ignore_schemas = ignore_schemas
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid schema pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            ignore_schemas,
            include_system_objects,
        }
    }

    /// Check if a schema should be included
    pub fn should_include_schema(&self, schema_name: &str) -> bool {
        // Roles, tablespaces and other cluster objects carry no schema
        if schema_name.is_empty() {
            return true;
        }

        if !self.include_system_objects && is_system_schema(schema_name) {
            return false;
        }

        !self.ignore_schemas.iter().any(|p| p.matches(schema_name))
    }

    pub fn should_include(&self, object: &DatabaseObject) -> bool {
        self.should_include_schema(object.schema())
    }

    pub fn filter<'a>(&self, objects: &'a [DatabaseObject]) -> Vec<&'a DatabaseObject> {
        objects.iter().filter(|o| self.should_include(o)).collect()
    }
}
