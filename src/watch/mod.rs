// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) with one
//!   watch per file the last build read.
//! - Debouncing raw events into build requests.
//! - Keeping the watch set in step with each build's dependency list.
//! - (Optionally) content hashing, so saves that do not change a file do
//!   not cause rebuilds.
//!
//! It does **not** know about compiling; it only turns filesystem changes
//! into runtime events.

pub mod cache;
pub mod debounce;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod tracker;
pub mod watcher;

pub use cache::{ContentFilter, FileCache};
pub use debounce::{spawn_debouncer, Debouncer};
pub use patterns::ExcludeMatcher;
pub use tracker::{plan_reconcile, DependencyTracker, WatchChanges, WatchState};
pub use watcher::{ChangeKind, NotifyWatchBackend, RawChange, WatchBackend};
