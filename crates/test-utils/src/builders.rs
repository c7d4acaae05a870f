#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stylewatch::config::{default_output_path, Config, WatchSettings, DEFAULT_DEBOUNCE_MS};
use stylewatch::types::PostProcessStep;
use tempfile::TempDir;

/// Builder for a resolved `Config`, skipping file and CLI parsing.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Config for `input` with defaults everywhere else, except that no
    /// post-processing runs (keeps expected outputs readable).
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Self {
            config: Config {
                output: default_output_path(&input),
                input,
                debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
                post_process: Vec::new(),
                watch: WatchSettings::default(),
            },
        }
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.output = output.into();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce = Duration::from_millis(ms);
        self
    }

    pub fn post_process(mut self, steps: Vec<PostProcessStep>) -> Self {
        self.config.post_process = steps;
        self
    }

    pub fn minify(mut self) -> Self {
        self.config
            .post_process
            .push(PostProcessStep::Minify { aggressive: false });
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// A throwaway project directory on the real filesystem.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path(rel)).ok()
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove file");
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
