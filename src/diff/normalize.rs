//! Definition normalization used to decide whether two objects differ.

use crate::diff::types::ComparisonMode;
use crate::migration::splitter::{dollar_tag_at, is_ident_char};

pub fn normalize_definition(definition: &str, mode: ComparisonMode) -> String {
    match mode {
        ComparisonMode::Strict => definition.to_string(),
        ComparisonMode::Lenient => normalize_lenient(definition),
    }
}

/// Collapse whitespace, fold case and drop spacing around punctuation,
/// leaving quoted text and dollar-quoted bodies untouched
fn normalize_lenient(definition: &str) -> String {
    let chars: Vec<char> = definition.trim().chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        let glue = matches!(c, '(' | ')' | ',') || out.ends_with(['(', ')', ',']);
        if pending_space && !out.is_empty() && !glue {
            out.push(' ');
        }
        pending_space = false;

        match c {
            '\'' | '"' => {
                let end = closing_quote(&chars, i, c);
                out.extend(&chars[i..end]);
                i = end;
            }
            '$' if !out.chars().last().is_some_and(is_ident_char) => {
                match dollar_tag_at(&chars, i) {
                    Some(tag) => {
                        let body_start = i + tag.chars().count();
                        let end = find_tag(&chars, body_start, &tag)
                            .map(|p| p + tag.chars().count())
                            .unwrap_or(chars.len());
                        out.extend(&chars[i..end]);
                        i = end;
                    }
                    None => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
            _ => {
                out.extend(c.to_lowercase());
                i += 1;
            }
        }
    }

    while out.ends_with(';') || out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Index just past the quote closing the one opened at `start`
fn closing_quote(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn find_tag(chars: &[char], from: usize, tag: &str) -> Option<usize> {
    let tag: Vec<char> = tag.chars().collect();
    (from..chars.len()).find(|&p| chars[p..].starts_with(&tag))
}
