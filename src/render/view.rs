//! Definitions of views and materialized views

use crate::catalog::view::{MaterializedView, View};
use crate::render::qualified;

fn query_text(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

pub fn render_create_view(view: &View) -> String {
    format!(
        "CREATE VIEW {} AS {}",
        qualified(&view.identity),
        query_text(&view.query)
    )
}

pub fn render_create_materialized_view(view: &MaterializedView) -> String {
    format!(
        "CREATE MATERIALIZED VIEW {} AS {} WITH {}DATA",
        qualified(&view.identity),
        query_text(&view.query),
        if view.with_data { "" } else { "NO " }
    )
}
