// src/build/postprocess/mod.rs

//! CSS post-processing transforms.
//!
//! Each transform implements [`PostProcessor`]; the configured
//! [`PostProcessStep`]s are turned into a [`PostProcessChain`] that applies
//! them in order and stops at the first failure.

use std::fmt::Debug;

use anyhow::Result;
use tracing::debug;

use crate::build::BuildError;
use crate::types::PostProcessStep;

pub mod minify;
pub mod prefix;

pub use minify::Minifier;
pub use prefix::Prefixer;

/// A single CSS-to-CSS transform.
pub trait PostProcessor: Send + Sync + Debug {
    /// Step name used in logs and error reports.
    fn name(&self) -> &str;

    fn process(&self, css: String) -> Result<String>;
}

/// Ordered list of transforms applied to every successful compile.
#[derive(Debug, Default)]
pub struct PostProcessChain {
    steps: Vec<Box<dyn PostProcessor>>,
}

impl PostProcessChain {
    pub fn new(steps: Vec<Box<dyn PostProcessor>>) -> Self {
        Self { steps }
    }

    /// Build the chain for the configured steps, preserving their order.
    pub fn from_steps(steps: &[PostProcessStep]) -> Self {
        let steps = steps
            .iter()
            .map(|step| -> Box<dyn PostProcessor> {
                match step {
                    PostProcessStep::Prefix { targets } => Box::new(Prefixer::new(targets)),
                    PostProcessStep::Minify { aggressive } => Box::new(Minifier::new(*aggressive)),
                }
            })
            .collect();
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn apply(&self, css: String) -> std::result::Result<String, BuildError> {
        let mut css = css;
        for step in &self.steps {
            debug!(step = step.name(), bytes = css.len(), "applying post-process step");
            css = step.process(css).map_err(|e| BuildError::PostProcess {
                step: step.name().to_string(),
                message: format!("{e:#}"),
            })?;
        }
        Ok(css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_preserves_configured_order() {
        let chain = PostProcessChain::from_steps(&PostProcessStep::defaults());
        assert_eq!(chain.names(), vec!["prefix", "minify"]);
    }

    #[test]
    fn prefixing_runs_before_minification() {
        let chain = PostProcessChain::from_steps(&PostProcessStep::defaults());
        let out = chain
            .apply("a {\n  user-select: none;\n}\n".to_string())
            .unwrap();
        assert_eq!(
            out,
            "a{-webkit-user-select:none;-moz-user-select:none;-ms-user-select:none;user-select:none}"
        );
    }

    #[test]
    fn failures_name_the_step() {
        let chain = PostProcessChain::from_steps(&[PostProcessStep::Minify { aggressive: false }]);
        let err = chain.apply("a { content: \"open }".to_string()).unwrap_err();
        match err {
            BuildError::PostProcess { step, .. } => assert_eq!(step, "minify"),
            other => panic!("expected post-process error, got {other:?}"),
        }
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = PostProcessChain::from_steps(&[]);
        assert!(chain.is_empty());
        assert_eq!(chain.apply("a { b: c }".to_string()).unwrap(), "a { b: c }");
    }
}
