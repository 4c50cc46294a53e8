//! Column-level ALTER TABLE actions

use crate::catalog::table::Column;
use crate::render::table::render_column;
use crate::render::quote_ident;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAction {
    Drop { name: String },
    Add { column: Column },
    AlterType { name: String, new_type: String },
    DropDefault { name: String },
    SetDefault { name: String, default: String },
    DropNotNull { name: String },
    SetNotNull { name: String },
}

impl ColumnAction {
    pub fn column_name(&self) -> &str {
        match self {
            ColumnAction::Add { column } => &column.name,
            ColumnAction::Drop { name }
            | ColumnAction::AlterType { name, .. }
            | ColumnAction::DropDefault { name }
            | ColumnAction::SetDefault { name, .. }
            | ColumnAction::DropNotNull { name }
            | ColumnAction::SetNotNull { name } => name,
        }
    }

    /// Position within one ALTER TABLE step
    pub fn priority(&self) -> u8 {
        match self {
            ColumnAction::Drop { .. } => 0,
            ColumnAction::Add { .. } => 1,
            ColumnAction::AlterType { .. } => 2,
            ColumnAction::DropDefault { .. } | ColumnAction::SetDefault { .. } => 3,
            ColumnAction::DropNotNull { .. } | ColumnAction::SetNotNull { .. } => 4,
        }
    }

    /// `table` is the already quoted `"schema"."table"`
    pub fn to_sql(&self, keyword: &str, table: &str, foreign: bool) -> String {
        let prefix = format!("ALTER {} {}", keyword, table);
        match self {
            ColumnAction::Drop { name } => {
                format!("{} DROP COLUMN IF EXISTS {};", prefix, quote_ident(name))
            }
            ColumnAction::Add { column } => {
                format!("{} ADD COLUMN {};", prefix, render_column(column))
            }
            ColumnAction::AlterType { name, new_type } => {
                let using = if foreign {
                    String::new()
                } else {
                    format!(" USING {}::{}", quote_ident(name), new_type)
                };
                format!(
                    "{} ALTER COLUMN {} TYPE {}{};",
                    prefix,
                    quote_ident(name),
                    new_type,
                    using
                )
            }
            ColumnAction::DropDefault { name } => format!(
                "{} ALTER COLUMN {} DROP DEFAULT;",
                prefix,
                quote_ident(name)
            ),
            ColumnAction::SetDefault { name, default } => format!(
                "{} ALTER COLUMN {} SET DEFAULT {};",
                prefix,
                quote_ident(name),
                default
            ),
            ColumnAction::DropNotNull { name } => format!(
                "{} ALTER COLUMN {} DROP NOT NULL;",
                prefix,
                quote_ident(name)
            ),
            ColumnAction::SetNotNull { name } => format!(
                "{} ALTER COLUMN {} SET NOT NULL;",
                prefix,
                quote_ident(name)
            ),
        }
    }
}
