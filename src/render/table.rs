//! Definitions of tables, columns, foreign tables and partitions

use crate::catalog::ObjectIdentity;
use crate::catalog::foreign_table::ForeignTable;
use crate::catalog::partition::Partition;
use crate::catalog::table::{Column, Table, TableColumn};
use crate::render::{escape_string, ident, qualified, qualified_relation};

/// `name type [DEFAULT expr] [NOT NULL]`
pub fn render_column(column: &Column) -> String {
    let mut sql = format!("{} {}", ident(&column.name), column.data_type);

    if let Some(default) = &column.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }

    if !column.is_nullable {
        sql.push_str(" NOT NULL");
    }

    sql
}

fn render_column_list(columns: &[Column]) -> String {
    if columns.is_empty() {
        return "()".to_string();
    }

    let body = columns
        .iter()
        .map(|c| format!("    {}", render_column(c)))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("(\n{}\n)", body)
}

pub fn render_create_table(table: &Table) -> String {
    let mut sql = format!(
        "CREATE TABLE {} {}",
        qualified(&table.identity),
        render_column_list(&table.columns)
    );

    if let Some(partition_by) = &table.partition_by {
        sql.push_str(&format!(" PARTITION BY {}", partition_by));
    }

    sql
}

pub fn render_add_column(column: &TableColumn) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        qualified_relation(&column.identity, &column.table_name),
        render_column(&column.as_column())
    )
}

pub fn render_create_foreign_table(table: &ForeignTable) -> String {
    let mut sql = format!(
        "CREATE FOREIGN TABLE {} {} SERVER {}",
        qualified(&table.identity),
        render_column_list(&table.columns),
        ident(&table.server)
    );

    if !table.options.is_empty() {
        let options = table
            .options
            .iter()
            .map(|(k, v)| format!("{} {}", ident(k), escape_string(v)))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" OPTIONS ({})", options));
    }

    sql
}

pub fn render_create_partition(partition: &Partition) -> String {
    format!(
        "CREATE TABLE {} PARTITION OF {} {}",
        qualified(&partition.identity),
        qualified(&ObjectIdentity::new(
            partition.identity.database.as_str(),
            partition.parent_schema(),
            partition.parent_table.as_str(),
        )),
        partition.bound
    )
}
