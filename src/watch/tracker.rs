// src/watch/tracker.rs

//! Keeps the set of watched files equal to the last successful build's
//! dependency list plus the root stylesheet.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::watch::path_utils::normalize_path;
use crate::watch::patterns::ExcludeMatcher;
use crate::watch::watcher::WatchBackend;

/// State of one logical watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// The backend is delivering events for this path.
    Active,
    /// The path belongs in the set but has no working handle (missing file,
    /// renamed away, backend error). Reinstalled on the next refresh.
    Lost,
}

/// Difference between two watch sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchChanges {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl WatchChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Paths in `target` but not `current` are added; paths in `current` but
/// not `target` are removed. Both lists come out sorted.
pub fn plan_reconcile(current: &BTreeSet<PathBuf>, target: &BTreeSet<PathBuf>) -> WatchChanges {
    WatchChanges {
        added: target.difference(current).cloned().collect(),
        removed: current.difference(target).cloned().collect(),
    }
}

pub struct DependencyTracker {
    root: PathBuf,
    exclude: ExcludeMatcher,
    watches: BTreeMap<PathBuf, WatchState>,
    backend: Box<dyn WatchBackend>,
}

impl fmt::Debug for DependencyTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyTracker")
            .field("root", &self.root)
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}

impl DependencyTracker {
    pub fn new(root: &Path, exclude: ExcludeMatcher, backend: Box<dyn WatchBackend>) -> Self {
        Self {
            root: normalize_path(root),
            exclude,
            watches: BTreeMap::new(),
            backend,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Watch the root stylesheet. The root stays watched for the whole
    /// session, whatever later builds report.
    pub fn start(&mut self) {
        let root = self.root.clone();
        self.install(&root);
        info!(root = %root.display(), "watching root stylesheet");
    }

    /// Current logical watch set, sorted.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.watches.keys().cloned().collect()
    }

    pub fn state_of(&self, path: &Path) -> Option<WatchState> {
        self.watches.get(&normalize_path(path)).copied()
    }

    pub fn lost(&self) -> Vec<PathBuf> {
        self.watches
            .iter()
            .filter(|(_, state)| **state == WatchState::Lost)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Make the watch set equal to `dependencies` (minus excluded paths)
    /// plus the root, and reinstall any lost handles.
    ///
    /// Returns what was added and removed.
    pub fn reconcile(&mut self, dependencies: &[PathBuf]) -> WatchChanges {
        let target = self.target_set(dependencies);
        let current: BTreeSet<PathBuf> = self.watches.keys().cloned().collect();
        let changes = plan_reconcile(&current, &target);

        for path in &changes.removed {
            if let Some(WatchState::Active) = self.watches.remove(path) {
                if let Err(err) = self.backend.unwatch(path) {
                    debug!(path = %path.display(), error = %err, "unwatch failed");
                }
            }
        }
        for path in &changes.added {
            self.install(path);
        }
        self.refresh();

        if !changes.is_empty() {
            debug!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                total = self.watches.len(),
                "watch set reconciled"
            );
        }
        changes
    }

    /// Reinstall lost handles without changing which paths are watched.
    pub fn refresh(&mut self) {
        for path in self.lost() {
            // The old handle may or may not still be registered.
            let _ = self.backend.unwatch(&path);
            self.install(&path);
        }
    }

    /// Record that the handle for `path` stopped delivering events.
    pub fn mark_lost(&mut self, path: &Path) {
        let path = normalize_path(path);
        match self.watches.get_mut(&path) {
            Some(state) if *state == WatchState::Active => {
                *state = WatchState::Lost;
                debug!(path = %path.display(), "watch handle lost");
            }
            Some(_) => {}
            None => debug!(path = %path.display(), "lost event for an unwatched path"),
        }
    }

    /// Remove every watch.
    pub fn shutdown(&mut self) {
        for (path, state) in std::mem::take(&mut self.watches) {
            if state == WatchState::Active {
                if let Err(err) = self.backend.unwatch(&path) {
                    debug!(path = %path.display(), error = %err, "unwatch failed during shutdown");
                }
            }
        }
        debug!("all watches removed");
    }

    fn target_set(&self, dependencies: &[PathBuf]) -> BTreeSet<PathBuf> {
        let mut target: BTreeSet<PathBuf> = dependencies
            .iter()
            .map(|p| normalize_path(p))
            .filter(|p| {
                let excluded = self.exclude.is_excluded(p);
                if excluded {
                    debug!(path = %p.display(), "dependency excluded from watching");
                }
                !excluded
            })
            .collect();
        target.insert(self.root.clone());
        target
    }

    fn install(&mut self, path: &Path) {
        let state = match self.backend.watch(path) {
            Ok(()) => WatchState::Active,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not watch file; will retry after the next build");
                WatchState::Lost
            }
        };
        self.watches.insert(path.to_path_buf(), state);
    }
}
