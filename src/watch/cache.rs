// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;
use crate::watch::watcher::{ChangeKind, RawChange};

/// In-memory cache of the last seen content hash per file.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `hash` for `path`. Returns true if the content differs from the
    /// last recorded hash, or if nothing was recorded yet.
    pub fn record(&mut self, path: &Path, hash: String) -> bool {
        match self.hashes.insert(path.to_path_buf(), hash) {
            Some(previous) => self.hashes.get(path) != Some(&previous),
            None => true,
        }
    }

    /// Invalidate the cached hash for a file (e.g. on removal).
    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!("invalidated cache for {:?}", path);
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Drops modification events whose file content did not actually change
/// (editors that touch files on focus, `touch`, identical saves).
#[derive(Debug)]
pub struct ContentFilter {
    fs: Arc<dyn FileSystem>,
    cache: FileCache,
}

impl ContentFilter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: FileCache::new(),
        }
    }

    /// Whether `change` should count towards a rebuild.
    ///
    /// Removals always count. Unreadable files count too, since the build
    /// will want to report them.
    pub async fn admit(&mut self, change: &RawChange) -> bool {
        if change.kind == ChangeKind::Removed {
            self.cache.invalidate(&change.path);
            return true;
        }

        let fs = Arc::clone(&self.fs);
        let path = change.path.clone();
        let hashed = tokio::task::spawn_blocking(move || compute_file_hash(fs.as_ref(), &path)).await;

        match hashed {
            Ok(Ok(hash)) => {
                let changed = self.cache.record(&change.path, hash);
                if !changed {
                    debug!(path = %change.path.display(), "content unchanged; ignoring event");
                }
                changed
            }
            Ok(Err(err)) => {
                debug!(path = %change.path.display(), error = %err, "could not hash changed file");
                self.cache.invalidate(&change.path);
                true
            }
            Err(join_err) => {
                debug!(error = %join_err, "hashing task aborted");
                true
            }
        }
    }
}
