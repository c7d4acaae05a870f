// src/build/pipeline.rs

//! A single build attempt, from reading the root file to writing the
//! artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::compile::{Compiler, ImportCompiler};
use crate::build::postprocess::PostProcessChain;
use crate::build::{BuildError, BuildResult};
use crate::config::Config;
use crate::fs::FileSystem;

/// Runs read → compile → post-process → write.
///
/// Each run is independent of earlier ones: it always reads the current
/// file contents and carries no state between attempts. The output file is
/// written exactly once per successful run and never touched by a failed
/// one.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    input: PathBuf,
    output: PathBuf,
    fs: Arc<dyn FileSystem>,
    compiler: Arc<dyn Compiler>,
    post_process: Arc<PostProcessChain>,
}

impl BuildPipeline {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        compiler: Arc<dyn Compiler>,
        post_process: PostProcessChain,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            fs,
            compiler,
            post_process: Arc::new(post_process),
        }
    }

    /// Pipeline with the built-in compiler and the configured transforms.
    pub fn from_config(config: &Config, fs: Arc<dyn FileSystem>) -> Self {
        let compiler: Arc<dyn Compiler> = Arc::new(ImportCompiler::new(Arc::clone(&fs)));
        Self::new(
            &config.input,
            &config.output,
            fs,
            compiler,
            PostProcessChain::from_steps(&config.post_process),
        )
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Run one attempt. Never panics on bad input; every failure becomes
    /// [`BuildResult::Failure`].
    pub fn run(&self) -> BuildResult {
        match self.try_run() {
            Ok((artifact, dependencies)) => BuildResult::Success {
                artifact,
                dependencies,
            },
            Err(err) => {
                debug!(stage = err.stage(), error = %err, "build attempt failed");
                BuildResult::Failure(err)
            }
        }
    }

    fn try_run(&self) -> Result<(Vec<u8>, Vec<PathBuf>), BuildError> {
        let source = self
            .fs
            .read_to_string(&self.input)
            .map_err(|e| BuildError::Read {
                path: self.input.clone(),
                message: format!("{e:#}"),
            })?;

        info!(input = %self.input.display(), "compiling");
        let compiled = self.compiler.compile(&self.input, &source)?;

        let css = if self.post_process.is_empty() {
            compiled.css
        } else {
            info!(steps = ?self.post_process.names(), "post-processing");
            self.post_process.apply(compiled.css)?
        };

        let artifact = css.into_bytes();
        self.fs
            .write_atomic(&self.output, &artifact)
            .map_err(|e| BuildError::Write {
                path: self.output.clone(),
                message: format!("{e:#}"),
            })?;

        debug!(
            output = %self.output.display(),
            bytes = artifact.len(),
            dependencies = compiled.dependencies.len(),
            "artifact written"
        );
        Ok((artifact, compiled.dependencies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::PostProcessStep;

    fn pipeline(fs: &MockFileSystem, steps: &[PostProcessStep]) -> BuildPipeline {
        let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
        let compiler: Arc<dyn Compiler> = Arc::new(ImportCompiler::new(Arc::clone(&fs)));
        BuildPipeline::new(
            "/p/a.less",
            "/p/a.css",
            fs,
            compiler,
            PostProcessChain::from_steps(steps),
        )
    }

    #[test]
    fn success_writes_once_and_reports_dependencies() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"b\";\na { user-select: none; }\n");
        fs.add_file("/p/b.less", "b { color: blue; }\n");

        let result = pipeline(&fs, &PostProcessStep::defaults()).run();

        let expected = "b{color:blue}a{-webkit-user-select:none;-moz-user-select:none;-ms-user-select:none;user-select:none}";
        assert_eq!(
            result,
            BuildResult::Success {
                artifact: expected.as_bytes().to_vec(),
                dependencies: vec![PathBuf::from("/p/b.less")],
            }
        );
        assert_eq!(fs.writes(), vec![PathBuf::from("/p/a.css")]);
        assert_eq!(fs.contents("/p/a.css").unwrap(), expected.as_bytes());
    }

    #[test]
    fn compile_failure_leaves_previous_output_untouched() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.css", "previous");
        fs.add_file("/p/a.less", "a { color: red;\n");

        let result = pipeline(&fs, &[]).run();

        assert!(matches!(result, BuildResult::Failure(BuildError::Compile { .. })));
        assert!(fs.writes().is_empty());
        assert_eq!(fs.contents("/p/a.css").unwrap(), b"previous");
    }

    #[test]
    fn post_process_failure_leaves_previous_output_untouched() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.css", "previous");
        // Inline imports are copied raw, so the broken string only surfaces
        // in the minifier.
        fs.add_file("/p/a.less", "@import (inline) \"raw.txt\";");
        fs.add_file("/p/raw.txt", "a { content: \"open }");

        let result = pipeline(&fs, &PostProcessStep::defaults()).run();

        match result {
            BuildResult::Failure(BuildError::PostProcess { step, .. }) => assert_eq!(step, "minify"),
            other => panic!("expected post-process failure, got {other:?}"),
        }
        assert_eq!(fs.contents("/p/a.css").unwrap(), b"previous");
    }

    #[test]
    fn missing_root_is_a_read_failure() {
        let fs = MockFileSystem::new();
        let result = pipeline(&fs, &[]).run();
        assert!(matches!(result, BuildResult::Failure(BuildError::Read { .. })));
    }

    #[test]
    fn write_failure_is_reported() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "a{}");
        fs.fail_writes_to("/p/a.css");

        let result = pipeline(&fs, &[]).run();
        assert!(matches!(result, BuildResult::Failure(BuildError::Write { .. })));
        assert!(fs.contents("/p/a.css").is_none());
    }
}
