// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What happened to a watched file, as far as rebuilding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Content or metadata changed; the watch is still valid.
    Modified,
    /// The file was deleted or renamed away; its watch handle is gone.
    Removed,
}

/// One undebounced filesystem notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Installs and removes OS-level watches on individual files.
///
/// Production code uses [`NotifyWatchBackend`]; tests provide an
/// implementation that only records which paths are watched.
pub trait WatchBackend: Send {
    fn watch(&mut self, path: &Path) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// Map a notify event kind onto a [`ChangeKind`]. `None` means the event
/// is irrelevant (reads, opens, plain closes).
pub fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeKind::Modified),
        EventKind::Access(_) => None,
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Removed),
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            Some(ChangeKind::Modified)
        }
    }
}

/// Split a notify event into one [`RawChange`] per affected path.
pub fn raw_changes(event: Event) -> Vec<RawChange> {
    let Some(kind) = classify(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .into_iter()
        .map(|path| RawChange { path, kind })
        .collect()
}

/// [`WatchBackend`] on top of a single `notify` watcher.
///
/// Every path gets its own non-recursive watch. Events are classified in the
/// notify callback and forwarded over `raw_tx`; the receiving side is the
/// debouncer.
pub struct NotifyWatchBackend {
    watcher: RecommendedWatcher,
}

impl fmt::Debug for NotifyWatchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatchBackend").finish_non_exhaustive()
    }
}

impl NotifyWatchBackend {
    pub fn new(raw_tx: mpsc::UnboundedSender<RawChange>) -> notify::Result<Self> {
        // Called synchronously on notify's own thread.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for change in raw_changes(event) {
                        if raw_tx.send(change).is_err() {
                            debug!("debouncer gone; dropping file event");
                            return;
                        }
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;
        Ok(Self { watcher })
    }
}

impl WatchBackend for NotifyWatchBackend {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher.unwatch(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};

    use super::*;

    #[test]
    fn classifies_relevant_events() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Removed)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(ChangeKind::Removed)
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            Some(ChangeKind::Modified)
        );
        assert_eq!(classify(&EventKind::Access(AccessKind::Read)), None);
    }

    #[test]
    fn one_change_per_path() {
        let event = Event::new(EventKind::Remove(RemoveKind::Any))
            .add_path(PathBuf::from("/a.less"))
            .add_path(PathBuf::from("/b.less"));
        let changes = raw_changes(event);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Removed));
    }
}
