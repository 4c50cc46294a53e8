//! Sequence definitions

use crate::catalog::sequence::Sequence;
use crate::render::qualified;

pub fn render_create_sequence(sequence: &Sequence) -> String {
    let o = &sequence.options;
    format!(
        "CREATE SEQUENCE {} AS {} INCREMENT BY {} MINVALUE {} MAXVALUE {} START WITH {} CACHE {} {}CYCLE",
        qualified(&sequence.identity),
        o.data_type,
        o.increment,
        o.min_value,
        o.max_value,
        o.start_value,
        o.cache,
        if o.cycle { "" } else { "NO " }
    )
}
