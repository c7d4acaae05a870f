// src/build/mod.rs

//! One build attempt: compile the root stylesheet, post-process the CSS and
//! write the artifact.
//!
//! - [`compile`] owns source parsing and dependency discovery.
//! - [`postprocess`] owns the ordered CSS transforms.
//! - [`pipeline`] runs the stages and turns every failure into a
//!   [`BuildResult::Failure`].
//! - [`backend`] runs pipelines off the event loop and reports completion
//!   back to the runtime.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub mod backend;
pub mod compile;
pub mod pipeline;
pub mod postprocess;

pub use backend::{BuildBackend, PipelineBackend};
pub use compile::{CompileOutput, Compiler, ImportCompiler};
pub use pipeline::BuildPipeline;
pub use postprocess::{Minifier, PostProcessChain, PostProcessor, Prefixer};

/// A position inside a source file, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Everything that can go wrong inside a single build.
///
/// None of these stop the watch loop; they are reported and the next change
/// triggers a fresh attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("{message}")]
    Compile {
        message: String,
        location: Option<SourceLocation>,
        /// Source lines around `location`, for display.
        extract: Vec<String>,
    },

    #[error("post-process step '{step}' failed: {message}")]
    PostProcess { step: String, message: String },

    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

impl BuildError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            BuildError::Compile { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Short stage name, used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            BuildError::Read { .. } => "read",
            BuildError::Compile { .. } => "compile",
            BuildError::PostProcess { .. } => "postprocess",
            BuildError::Write { .. } => "write",
        }
    }
}

/// Outcome of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    Success {
        /// The bytes that were written to the output path.
        artifact: Vec<u8>,
        /// Every file the build read besides the root, as absolute paths.
        dependencies: Vec<PathBuf>,
    },
    Failure(BuildError),
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success { .. })
    }
}
