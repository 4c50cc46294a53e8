//! Definitions of table-scoped objects: indexes, constraints and triggers

use crate::catalog::constraint::Constraint;
use crate::catalog::index::Index;
use crate::catalog::triggers::Trigger;
use crate::render::{ident, qualified_relation};

pub fn render_create_index(index: &Index) -> String {
    let mut sql = format!(
        "CREATE {}INDEX {} ON {} USING {} ({})",
        if index.is_unique { "UNIQUE " } else { "" },
        ident(&index.identity.name),
        qualified_relation(&index.identity, &index.table_name),
        index.method,
        index.columns.join(", ")
    );

    if let Some(predicate) = &index.predicate {
        sql.push_str(&format!(" WHERE {}", predicate));
    }

    sql
}

pub fn render_add_constraint(constraint: &Constraint) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {}",
        qualified_relation(&constraint.identity, &constraint.table_name),
        ident(&constraint.identity.name),
        constraint.definition
    )
}

pub fn render_create_trigger(trigger: &Trigger) -> String {
    let events = trigger
        .events
        .iter()
        .map(|e| e.as_sql())
        .collect::<Vec<_>>()
        .join(" OR ");

    let mut sql = format!(
        "CREATE TRIGGER {} {} {} ON {} FOR EACH {}",
        ident(&trigger.identity.name),
        trigger.timing.as_sql(),
        events,
        qualified_relation(&trigger.identity, &trigger.table_name),
        if trigger.for_each_row { "ROW" } else { "STATEMENT" }
    );

    if let Some(condition) = &trigger.when {
        sql.push_str(&format!(" WHEN ({})", condition));
    }

    let function = trigger
        .function_name
        .split('.')
        .map(ident)
        .collect::<Vec<_>>()
        .join(".");
    sql.push_str(&format!(" EXECUTE FUNCTION {}()", function));
    sql
}
