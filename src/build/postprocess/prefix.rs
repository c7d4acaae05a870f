// src/build/postprocess/prefix.rs

//! Vendor prefix insertion.
//!
//! For a small table of properties that still need prefixes in some engines,
//! a prefixed copy of each declaration is inserted right before the standard
//! one. Which prefixes are emitted depends on the configured browser targets.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::Result;
use regex::{Captures, Regex};

use super::PostProcessor;
use crate::types::VendorPrefix;

use VendorPrefix::{Moz, Ms, Webkit};

/// Properties that get prefixed copies, and the prefixes each one needs.
///
/// Longer names sharing a stem must come first so the regex alternation
/// prefers them (`mask-image` before `mask`).
const PREFIXED_PROPERTIES: &[(&str, &[VendorPrefix])] = &[
    ("user-select", &[Webkit, Moz, Ms]),
    ("appearance", &[Webkit, Moz]),
    ("backdrop-filter", &[Webkit]),
    ("text-size-adjust", &[Webkit, Moz, Ms]),
    ("hyphens", &[Webkit, Moz, Ms]),
    ("tab-size", &[Moz]),
    ("mask-image", &[Webkit]),
    ("mask-size", &[Webkit]),
    ("mask", &[Webkit]),
    ("box-decoration-break", &[Webkit]),
    ("clip-path", &[Webkit]),
    ("text-emphasis", &[Webkit]),
    ("print-color-adjust", &[Webkit]),
];

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = PREFIXED_PROPERTIES.iter().map(|(name, _)| *name).collect();
    Regex::new(&format!(
        r"(?P<indent>[ \t]*)(?P<prop>{})\s*:\s*(?P<value>[^;{{}}]*)",
        names.join("|")
    ))
    .expect("declaration regex is valid")
});

#[derive(Debug, Clone)]
pub struct Prefixer {
    targets: Vec<String>,
    enabled: BTreeSet<VendorPrefix>,
}

impl Prefixer {
    pub fn new(targets: &[String]) -> Self {
        Self {
            targets: targets.to_vec(),
            enabled: prefixes_for_targets(targets),
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn enabled_prefixes(&self) -> &BTreeSet<VendorPrefix> {
        &self.enabled
    }

    fn prefix(&self, css: &str) -> String {
        DECLARATION_RE
            .replace_all(css, |caps: &Captures| self.expand(css, caps))
            .into_owned()
    }

    fn expand(&self, css: &str, caps: &Captures) -> String {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        let before = &css[..start];

        // Only declarations that start a statement: right after `{`, `;` or
        // at the very beginning. This skips `-webkit-user-select` and the
        // like, whose match starts mid-word.
        let trimmed = before.trim_end();
        if !(trimmed.is_empty() || trimmed.ends_with('{') || trimmed.ends_with(';')) {
            return whole.to_string();
        }

        let prop = &caps["prop"];
        let indent = &caps["indent"];
        let value = caps["value"].trim_end();
        let Some((_, needed)) = PREFIXED_PROPERTIES.iter().find(|(name, _)| *name == prop) else {
            return whole.to_string();
        };

        let block = &before[before.rfind('{').map_or(0, |i| i + 1)..];
        let sep = if before[trimmed.len()..].contains('\n') { "\n" } else { "" };

        let mut out = String::new();
        for prefix in needed.iter().filter(|p| self.enabled.contains(p)) {
            let prefixed = format!("{}{}", prefix.as_str(), prop);
            if block.contains(&prefixed) {
                continue;
            }
            out.push_str(&format!("{indent}{prefixed}: {value};{sep}"));
        }
        out.push_str(whole);
        out
    }
}

impl PostProcessor for Prefixer {
    fn name(&self) -> &str {
        "prefix"
    }

    fn process(&self, css: String) -> Result<String> {
        Ok(self.prefix(&css))
    }
}

/// Map browser targets (e.g. `"ie 11"`, `"last 2 versions"`) onto the
/// prefix families they need. Anything that is not a plain browser name is
/// treated as a broad query and enables every family.
fn prefixes_for_targets(targets: &[String]) -> BTreeSet<VendorPrefix> {
    let mut enabled = BTreeSet::new();
    if targets.is_empty() {
        enabled.extend(VendorPrefix::ALL);
        return enabled;
    }

    for target in targets {
        let family = target
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match family.as_str() {
            "ie" | "ie_mob" | "explorer" => {
                enabled.insert(Ms);
            }
            "edge" => {
                enabled.insert(Ms);
                enabled.insert(Webkit);
            }
            "firefox" | "ff" | "fx" | "and_ff" => {
                enabled.insert(Moz);
            }
            "safari" | "ios" | "ios_saf" | "chrome" | "and_chr" | "android" | "opera"
            | "op_mob" | "samsung" => {
                enabled.insert(Webkit);
            }
            _ => enabled.extend(VendorPrefix::ALL),
        }
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixer(targets: &[&str]) -> Prefixer {
        let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        Prefixer::new(&targets)
    }

    #[test]
    fn multi_line_declarations_keep_indentation() {
        let out = prefixer(&[]).prefix("a {\n  user-select: none;\n}\n");
        assert_eq!(
            out,
            "a {\n  -webkit-user-select: none;\n  -moz-user-select: none;\n  -ms-user-select: none;\n  user-select: none;\n}\n"
        );
    }

    #[test]
    fn targets_narrow_the_prefixes() {
        let out = prefixer(&["firefox 60"]).prefix("a{user-select:none}");
        assert_eq!(out, "a{-moz-user-select: none;user-select:none}");

        let out = prefixer(&["ie 11", "safari 9"]).prefix("a{hyphens:auto}");
        assert_eq!(out, "a{-webkit-hyphens: auto;-ms-hyphens: auto;hyphens:auto}");
    }

    #[test]
    fn existing_prefixes_are_not_duplicated() {
        let out = prefixer(&[]).prefix("b {\n  -webkit-appearance: none;\n  appearance: none;\n}");
        assert_eq!(
            out,
            "b {\n  -webkit-appearance: none;\n  -moz-appearance: none;\n  appearance: none;\n}"
        );
    }

    #[test]
    fn values_mentioning_properties_are_untouched() {
        let css = "a { transition: user-select 1s; will-change: mask; }";
        assert_eq!(prefixer(&[]).prefix(css), css);
    }

    #[test]
    fn longer_property_names_win() {
        let out = prefixer(&["chrome 80"]).prefix("a{mask-image:url(m.svg)}");
        assert_eq!(out, "a{-webkit-mask-image: url(m.svg);mask-image:url(m.svg)}");
    }

    #[test]
    fn broad_queries_enable_everything() {
        let p = prefixer(&["last 2 versions"]);
        assert_eq!(p.enabled_prefixes().len(), 3);
    }
}
