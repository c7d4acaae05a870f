// src/build/postprocess/minify.rs

//! Whitespace and comment compaction.

use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::{Captures, Regex};

use super::PostProcessor;

/// Delimiters of the placeholder that stands in for a string literal while
/// the aggressive rewrites run.
const LITERAL_OPEN: char = '\u{E000}';
const LITERAL_CLOSE: char = '\u{E001}';

static LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{E000}([0-9]+)\u{E001}").expect("literal placeholder regex is valid")
});

static EMPTY_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^{};]+\{\}").expect("empty rule regex is valid"));

static ZERO_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pre>[\s:,(])0+(?:\.0+)?(?:px|em|rem|ex|ch|vw|vh|vmin|vmax|cm|mm|in|pt|pc)\b")
        .expect("zero unit regex is valid")
});

/// Removes comments (except `/*! ... */` license blocks) and insignificant
/// whitespace. String literals are copied untouched.
///
/// With `aggressive`, empty rules are dropped and zero lengths lose their
/// unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minifier {
    aggressive: bool,
}

impl Minifier {
    pub fn new(aggressive: bool) -> Self {
        Self { aggressive }
    }

    pub fn aggressive(&self) -> bool {
        self.aggressive
    }
}

impl PostProcessor for Minifier {
    fn name(&self) -> &str {
        "minify"
    }

    fn process(&self, css: String) -> Result<String> {
        let mut compacted = compact(&css)?;
        if self.aggressive {
            let mut text = ZERO_UNIT_RE
                .replace_all(&compacted.text, "${pre}0")
                .into_owned();
            loop {
                let next = EMPTY_RULE_RE.replace_all(&text, "").into_owned();
                if next == text {
                    break;
                }
                text = next;
            }
            compacted.text = text;
        }
        Ok(compacted.restore())
    }
}

/// Compacted stylesheet whose string literals are replaced by indexed
/// placeholders.
struct Compacted {
    text: String,
    literals: Vec<String>,
}

impl Compacted {
    fn push_literal(&mut self, literal: String) {
        self.text.push(LITERAL_OPEN);
        self.text.push_str(&self.literals.len().to_string());
        self.text.push(LITERAL_CLOSE);
        self.literals.push(literal);
    }

    fn restore(self) -> String {
        LITERAL_RE
            .replace_all(&self.text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| self.literals.get(idx))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// No space is needed after these characters.
fn tight_after(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ',' | '>' | ':')
}

/// No space is needed before these characters. `:` is handled separately so
/// that `a :hover` keeps its meaning.
fn tight_before(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ',' | '>')
}

/// Whether the statement starting at `from` opens a block before it ends,
/// i.e. whether it is a selector rather than a declaration.
fn opens_block_ahead(chars: &[char], from: usize) -> bool {
    let n = chars.len();
    let mut i = from;
    while i < n {
        match chars[i] {
            '{' => return true,
            ';' | '}' => return false,
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < n && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            quote @ ('"' | '\'') => {
                i += 1;
                while i < n && chars[i] != quote {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

fn compact(css: &str) -> Result<Compacted> {
    let chars: Vec<char> = css.chars().collect();
    let n = chars.len();
    let mut out = Compacted {
        text: String::with_capacity(css.len()),
        literals: Vec::new(),
    };
    let mut pending_space = false;
    let mut depth = 0usize;
    let mut i = 0;

    while i < n {
        let c = chars[i];

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let keep = chars.get(i + 2) == Some(&'!');
            let start = i;
            i += 2;
            while i < n && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            if i >= n {
                bail!("unterminated comment starting at character {}", start + 1);
            }
            i += 2;
            if keep {
                flush_space(&mut out.text, &mut pending_space, '/');
                out.text.extend(&chars[start..i]);
            } else {
                pending_space = true;
            }
            continue;
        }

        // Inside a block, a space before `:` belongs to a declaration unless
        // the statement goes on to open a nested rule.
        if c == ':' && pending_space && depth > 0 && !opens_block_ahead(&chars, i + 1) {
            pending_space = false;
        }
        flush_space(&mut out.text, &mut pending_space, c);

        if c == '"' || c == '\'' {
            let start = i;
            let mut literal = String::from(c);
            i += 1;
            loop {
                if i >= n {
                    bail!("unterminated string starting at character {}", start + 1);
                }
                let ch = chars[i];
                literal.push(ch);
                i += 1;
                if ch == '\\' && i < n {
                    literal.push(chars[i]);
                    i += 1;
                } else if ch == c {
                    break;
                }
            }
            out.push_literal(literal);
            continue;
        }

        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if out.text.ends_with(';') {
                    out.text.pop();
                }
            }
            _ => {}
        }
        out.text.push(c);
        i += 1;
    }

    Ok(out)
}

fn flush_space(out: &mut String, pending_space: &mut bool, next: char) {
    if *pending_space {
        let needed = out
            .chars()
            .next_back()
            .is_some_and(|last| !tight_after(last) && !tight_before(next));
        if needed {
            out.push(' ');
        }
        *pending_space = false;
    }
}
