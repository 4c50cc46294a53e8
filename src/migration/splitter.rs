//! Splits SQL scripts into statements without breaking dollar-quoted
//! routine bodies, quoted strings or comments.

use crate::error::SplitError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuote { escapes: bool, line: usize },
    DoubleQuote { line: usize },
    DollarQuote { tag: String, line: usize },
    LineComment,
    BlockComment { depth: usize, line: usize },
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Read a `$tag$` opener starting at `start`; returns the full tag text
pub(crate) fn dollar_tag_at(chars: &[char], start: usize) -> Option<String> {
    let mut end = start + 1;
    while end < chars.len() && chars[end] != '$' {
        let c = chars[end];
        let valid = if end == start + 1 {
            c.is_alphabetic() || c == '_'
        } else {
            is_ident_char(c)
        };
        if !valid {
            return None;
        }
        end += 1;
    }

    (end < chars.len()).then(|| chars[start..=end].iter().collect())
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    let mut i = at;
    for n in needle.chars() {
        if chars.get(i) != Some(&n) {
            return false;
        }
        i += 1;
    }
    true
}

struct Splitter {
    statements: Vec<String>,
    current: String,
    has_code: bool,
}

impl Splitter {
    /// Comments ahead of a statement's first token are not kept
    fn push(&mut self, c: char, code: bool) {
        if code {
            self.has_code = true;
        }
        if self.has_code {
            self.current.push(c);
        }
    }

    fn push_str(&mut self, s: &str) {
        self.has_code = true;
        self.current.push_str(s);
    }

    fn finish(&mut self) {
        let trimmed = self.current.trim();
        if self.has_code && !trimmed.is_empty() {
            self.statements.push(trimmed.to_string());
        }
        self.current.clear();
        self.has_code = false;
    }
}

/// Split `script` into trimmed, non-empty statements.
///
/// A `;` ends a statement only outside quotes, dollar-quoted blocks and
/// comments. Fragments holding nothing but comments are dropped.
pub fn split_statements(script: &str) -> Result<Vec<String>, SplitError> {
    let chars: Vec<char> = script.chars().collect();
    let mut splitter = Splitter {
        statements: Vec::new(),
        current: String::new(),
        has_code: false,
    };
    let mut state = State::Normal;
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| chars[p]);

        match &mut state {
            State::Normal => match c {
                ';' => splitter.finish(),
                '-' if next == Some('-') => {
                    state = State::LineComment;
                    splitter.push(c, false);
                }
                '/' if next == Some('*') => {
                    state = State::BlockComment { depth: 1, line };
                    splitter.push(c, false);
                    splitter.push('*', false);
                    i += 1;
                }
                '\'' => {
                    let escapes = matches!(prev, Some('E' | 'e'))
                        && !i
                            .checked_sub(2)
                            .is_some_and(|p| is_ident_char(chars[p]));
                    state = State::SingleQuote { escapes, line };
                    splitter.push(c, true);
                }
                '"' => {
                    state = State::DoubleQuote { line };
                    splitter.push(c, true);
                }
                '$' if !prev.is_some_and(is_ident_char) => match dollar_tag_at(&chars, i) {
                    Some(tag) => {
                        i += tag.chars().count();
                        splitter.push_str(&tag);
                        state = State::DollarQuote { tag, line };
                        continue;
                    }
                    None => splitter.push(c, true),
                },
                _ => splitter.push(c, !c.is_whitespace()),
            },
            State::SingleQuote { escapes, .. } => {
                splitter.push(c, true);
                if *escapes && c == '\\' {
                    if let Some(n) = next {
                        splitter.push(n, true);
                        if n == '\n' {
                            line += 1;
                        }
                    }
                    i += 2;
                    continue;
                }
                if c == '\'' {
                    if next == Some('\'') {
                        splitter.push('\'', true);
                        i += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::DoubleQuote { .. } => {
                splitter.push(c, true);
                if c == '"' {
                    if next == Some('"') {
                        splitter.push('"', true);
                        i += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::DollarQuote { tag, .. } => {
                if c == '$' && starts_with_at(&chars, i, tag) {
                    let len = tag.chars().count();
                    splitter.push_str(tag);
                    state = State::Normal;
                    i += len;
                    continue;
                }
                splitter.push(c, true);
            }
            State::LineComment => {
                splitter.push(c, false);
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment { depth, .. } => {
                if c == '*' && next == Some('/') {
                    splitter.push(c, false);
                    splitter.push('/', false);
                    *depth -= 1;
                    if *depth == 0 {
                        state = State::Normal;
                    }
                    i += 2;
                    continue;
                }
                if c == '/' && next == Some('*') {
                    splitter.push(c, false);
                    splitter.push('*', false);
                    *depth += 1;
                    i += 2;
                    continue;
                }
                splitter.push(c, false);
            }
        }

        if c == '\n' {
            line += 1;
        }
        i += 1;
    }

    match state {
        State::Normal | State::LineComment => {}
        State::DollarQuote { tag, line } => {
            return Err(SplitError::UnterminatedDollarQuote { tag, line });
        }
        State::SingleQuote { line, .. } => {
            return Err(SplitError::UnterminatedQuote {
                kind: "string",
                line,
            });
        }
        State::DoubleQuote { line } => {
            return Err(SplitError::UnterminatedQuote {
                kind: "identifier",
                line,
            });
        }
        State::BlockComment { line, .. } => {
            return Err(SplitError::UnterminatedComment { line });
        }
    }

    splitter.finish();
    Ok(splitter.statements)
}
