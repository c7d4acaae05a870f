// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::watch::path_utils::relative_str;

/// Compiled `[watch].exclude` patterns.
///
/// Patterns are evaluated against paths relative to `base` (the directory of
/// the root stylesheet), e.g. `"vendor/**"` or `"**/*.generated.less"`.
/// Paths outside `base` are matched on their full form.
#[derive(Clone)]
pub struct ExcludeMatcher {
    base: PathBuf,
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeMatcher")
            .field("base", &self.base)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl ExcludeMatcher {
    pub fn new(base: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let set = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(patterns).context("building exclude globset")?)
        };
        Ok(Self {
            base: base.into(),
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// Matcher that excludes nothing.
    pub fn none(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            patterns: Vec::new(),
            set: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        match relative_str(&self.base, path) {
            Some(rel) => set.is_match(&rel),
            None => set.is_match(path),
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_relative_to_base() {
        let m = ExcludeMatcher::new(
            "/p/styles",
            &["vendor/**".to_string(), "**/*.gen.less".to_string()],
        )
        .unwrap();

        assert!(m.is_excluded(Path::new("/p/styles/vendor/reset.less")));
        assert!(m.is_excluded(Path::new("/p/styles/a/b/x.gen.less")));
        assert!(!m.is_excluded(Path::new("/p/styles/theme.less")));
    }

    #[test]
    fn empty_matcher_excludes_nothing() {
        let m = ExcludeMatcher::none("/p");
        assert!(m.is_empty());
        assert!(!m.is_excluded(Path::new("/p/anything.less")));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(ExcludeMatcher::new("/p", &["a[".to_string()]).is_err());
    }
}
