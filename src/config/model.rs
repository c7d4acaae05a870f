// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::PostProcessStep;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [build]
/// input = "style.less"
/// output = "style.css"
/// debounce_ms = 500
///
/// [watch]
/// exclude = ["vendor/**"]
/// use_hash = false
///
/// [[postprocess]]
/// name = "prefix"
/// targets = ["last 2 versions"]
///
/// [[postprocess]]
/// name = "minify"
/// aggressive = false
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// `[build]` section.
    #[serde(default)]
    pub build: BuildSection,

    /// `[watch]` section.
    #[serde(default)]
    pub watch: WatchSection,

    /// Ordered `[[postprocess]]` entries.
    ///
    /// `None` means "not mentioned", which selects the default chain; an
    /// explicit empty list disables post-processing entirely.
    #[serde(default)]
    pub postprocess: Option<Vec<PostProcessStep>>,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    /// Root stylesheet, relative to the config file.
    #[serde(default)]
    pub input: Option<String>,

    /// Output path, relative to the config file.
    #[serde(default)]
    pub output: Option<String>,

    /// Debounce window in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Glob patterns (relative to the input's directory) for imported files
    /// that should never be watched. The root input is always watched.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Drop change events that do not alter a file's contents.
    #[serde(default)]
    pub use_hash: bool,
}

/// A validated configuration file.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or the loader, so holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub build: BuildSection,
    pub watch: WatchSection,
    pub postprocess: Option<Vec<PostProcessStep>>,
    base_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        build: BuildSection,
        watch: WatchSection,
        postprocess: Option<Vec<PostProcessStep>>,
    ) -> Self {
        Self {
            build,
            watch,
            postprocess,
            base_dir: None,
        }
    }

    /// Directory that relative paths inside the file are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}
