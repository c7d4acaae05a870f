// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory filesystem for tests.
///
/// Clones share the same underlying state, so a test can keep one handle to
/// edit "files" while the pipeline reads through another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    failing_writes: HashSet<PathBuf>,
    writes: Vec<PathBuf>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.inner.lock().unwrap();
        state
            .files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let mut state = self.inner.lock().unwrap();
        state.files.remove(path.as_ref());
    }

    /// Current contents of `path`, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let state = self.inner.lock().unwrap();
        state.files.get(path.as_ref()).cloned()
    }

    /// Make every subsequent write to `path` fail (disk full, permissions).
    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        let mut state = self.inner.lock().unwrap();
        state.failing_writes.insert(path.as_ref().to_path_buf());
    }

    /// Paths of all successful writes, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        let state = self.inner.lock().unwrap();
        state.writes.clone()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.inner.lock().unwrap();
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if state.failing_writes.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.inner.lock().unwrap();
        state.files.contains_key(path)
    }
}
