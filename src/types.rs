use std::fmt;

use serde::Deserialize;

/// One post-processing transform, as listed under `[[postprocess]]`.
///
/// The list is ordered; the pipeline applies the steps exactly in the order
/// they appear. Validation guarantees that `prefix` (if present) comes before
/// `minify`, since minification restructures declarations in ways that make
/// later prefix insertion miss them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase", deny_unknown_fields)]
pub enum PostProcessStep {
    /// Insert vendor-prefixed copies of declarations for the given targets.
    Prefix {
        #[serde(default)]
        targets: Vec<String>,
    },
    /// Strip comments and whitespace.
    Minify {
        #[serde(default)]
        aggressive: bool,
    },
}

impl PostProcessStep {
    pub fn name(&self) -> &'static str {
        match self {
            PostProcessStep::Prefix { .. } => "prefix",
            PostProcessStep::Minify { .. } => "minify",
        }
    }

    /// The steps used when neither the config file nor the CLI says otherwise.
    pub fn defaults() -> Vec<PostProcessStep> {
        vec![
            PostProcessStep::Prefix {
                targets: Vec::new(),
            },
            PostProcessStep::Minify { aggressive: false },
        ]
    }
}

impl fmt::Display for PostProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostProcessStep::Prefix { targets } if targets.is_empty() => write!(f, "prefix"),
            PostProcessStep::Prefix { targets } => write!(f, "prefix ({})", targets.join(", ")),
            PostProcessStep::Minify { aggressive: true } => write!(f, "minify (aggressive)"),
            PostProcessStep::Minify { aggressive: false } => write!(f, "minify"),
        }
    }
}

/// Vendor prefix families the prefixer knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VendorPrefix {
    Webkit,
    Moz,
    Ms,
}

impl VendorPrefix {
    pub const ALL: [VendorPrefix; 3] = [VendorPrefix::Webkit, VendorPrefix::Moz, VendorPrefix::Ms];

    pub fn as_str(self) -> &'static str {
        match self {
            VendorPrefix::Webkit => "-webkit-",
            VendorPrefix::Moz => "-moz-",
            VendorPrefix::Ms => "-ms-",
        }
    }
}
