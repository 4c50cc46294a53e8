//! Definitions of functions and procedures

use crate::catalog::function::{Function, Procedure};
use crate::render::{dollar_quote, ident, qualified};

pub fn render_create_function(function: &Function) -> String {
    let parameters = function
        .parameters
        .as_deref()
        .unwrap_or(&function.arguments);

    let mut sql = format!(
        "CREATE FUNCTION {}({}) RETURNS {} LANGUAGE {}",
        qualified(&function.identity),
        parameters,
        function.return_type,
        ident(&function.language)
    );

    if let Some(volatility) = function.volatility {
        sql.push(' ');
        sql.push_str(volatility.as_sql());
    }

    sql.push_str(" AS ");
    sql.push_str(&dollar_quote(&function.body));
    sql
}

pub fn render_create_procedure(procedure: &Procedure) -> String {
    let parameters = procedure
        .parameters
        .as_deref()
        .unwrap_or(&procedure.arguments);

    format!(
        "CREATE PROCEDURE {}({}) LANGUAGE {} AS {}",
        qualified(&procedure.identity),
        parameters,
        ident(&procedure.language),
        dollar_quote(&procedure.body)
    )
}
