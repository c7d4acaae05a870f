// src/build/compile/parse.rs

//! Single-file scanner: splits a stylesheet into text and `@import`
//! statements and checks strings, comments and braces.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::build::{BuildError, SourceLocation};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^@import\s*(?:\((?P<opts>[^)]*)\)\s*)?(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)'|url\(\s*(?:"(?P<udq>[^"\n]*)"|'(?P<usq>[^'\n]*)'|(?P<ubare>[^)"'\s]*))\s*\))(?P<media>[^;{}]*);"#,
    )
    .expect("import regex is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ImportOptions {
    pub(super) css: bool,
    pub(super) less: bool,
    pub(super) multiple: bool,
    pub(super) optional: bool,
    pub(super) inline: bool,
    pub(super) reference: bool,
}

impl ImportOptions {
    fn parse(raw: &str) -> Result<Self, String> {
        let mut opts = ImportOptions::default();
        for word in raw.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            match word.to_ascii_lowercase().as_str() {
                "css" => opts.css = true,
                "less" => opts.less = true,
                "once" => opts.multiple = false,
                "multiple" => opts.multiple = true,
                "optional" => opts.optional = true,
                "inline" => opts.inline = true,
                "reference" => opts.reference = true,
                other => return Err(format!("unknown @import option '{other}'")),
            }
        }
        Ok(opts)
    }
}

#[derive(Debug, Clone)]
pub(super) struct ImportStmt {
    pub(super) target: String,
    pub(super) options: ImportOptions,
    pub(super) media: Option<String>,
    pub(super) raw: String,
    pub(super) location: SourceLocation,
}

#[derive(Debug, Clone)]
pub(super) enum Segment {
    Text(String),
    Import(ImportStmt),
}

/// Scan one file into text and `@import` segments, checking that strings,
/// comments and braces are well formed.
pub(super) fn parse_file(file: &Path, src: &str) -> Result<Vec<Segment>, BuildError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let n = chars.len();

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut braces: Vec<SourceLocation> = Vec::new();
    let mut paren_depth = 0usize;

    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    let loc = |line: usize, column: usize| SourceLocation {
        file: file.to_path_buf(),
        line,
        column,
    };

    // Advance past `chars[i]`, keeping line/column in sync.
    macro_rules! bump {
        () => {{
            if chars[i].1 == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
            i += 1;
        }};
    }

    while i < n {
        let (byte, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        match c {
            '"' | '\'' => {
                let start = loc(line, col);
                text.push(c);
                bump!();
                loop {
                    if i >= n || chars[i].1 == '\n' {
                        return Err(compile_error(src, "unterminated string", start));
                    }
                    let ch = chars[i].1;
                    text.push(ch);
                    bump!();
                    if ch == '\\' {
                        if i < n {
                            text.push(chars[i].1);
                            bump!();
                        }
                    } else if ch == c {
                        break;
                    }
                }
            }
            '/' if next == Some('*') => {
                let start = loc(line, col);
                text.push_str("/*");
                bump!();
                bump!();
                loop {
                    if i >= n {
                        return Err(compile_error(src, "unterminated comment", start));
                    }
                    let ch = chars[i].1;
                    text.push(ch);
                    bump!();
                    if ch == '*' && i < n && chars[i].1 == '/' {
                        text.push('/');
                        bump!();
                        break;
                    }
                }
            }
            '/' if next == Some('/') && paren_depth == 0 => {
                while i < n && chars[i].1 != '\n' {
                    bump!();
                }
            }
            '(' => {
                paren_depth += 1;
                text.push(c);
                bump!();
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                text.push(c);
                bump!();
            }
            '{' => {
                braces.push(loc(line, col));
                text.push(c);
                bump!();
            }
            '}' => {
                if braces.pop().is_none() {
                    return Err(compile_error(src, "unexpected '}'", loc(line, col)));
                }
                text.push(c);
                bump!();
            }
            '@' if starts_with_import(&src[byte..]) => {
                let start = loc(line, col);
                let stmt = parse_import(&src[byte..], start).map_err(|(msg, at)| {
                    compile_error(src, &msg, at)
                })?;

                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                let consumed = stmt.raw.chars().count();
                segments.push(Segment::Import(stmt));
                for _ in 0..consumed {
                    bump!();
                }
            }
            _ => {
                text.push(c);
                bump!();
            }
        }
    }

    if let Some(open) = braces.pop() {
        return Err(compile_error(src, "missing closing '}'", open));
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

fn starts_with_import(rest: &str) -> bool {
    let keyword = rest
        .get(..7)
        .is_some_and(|p| p.eq_ignore_ascii_case("@import"));
    keyword
        && !rest[7..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn parse_import(
    rest: &str,
    location: SourceLocation,
) -> Result<ImportStmt, (String, SourceLocation)> {
    let caps = IMPORT_RE
        .captures(rest)
        .ok_or_else(|| ("malformed @import statement".to_string(), location.clone()))?;

    let target = ["dq", "sq", "udq", "usq", "ubare"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    if target.trim().is_empty() {
        return Err(("@import with an empty path".to_string(), location));
    }

    let options = match caps.name("opts") {
        Some(m) => ImportOptions::parse(m.as_str()).map_err(|msg| (msg, location.clone()))?,
        None => ImportOptions::default(),
    };

    let media = caps
        .name("media")
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty());

    Ok(ImportStmt {
        target,
        options,
        media,
        raw: caps[0].to_string(),
        location,
    })
}

pub(super) fn compile_error(src: &str, message: &str, location: SourceLocation) -> BuildError {
    BuildError::Compile {
        message: message.to_string(),
        extract: extract_lines(src, location.line),
        location: Some(location),
    }
}

/// The offending line and its neighbours, LESS-style.
fn extract_lines(src: &str, line: usize) -> Vec<String> {
    let first = line.saturating_sub(1).max(1);
    src.lines()
        .enumerate()
        .map(|(idx, l)| (idx + 1, l))
        .filter(|(no, _)| *no >= first && *no <= line + 1)
        .map(|(no, l)| format!("{no} {l}"))
        .collect()
}
