// src/engine/mod.rs

//! Orchestration engine for stylewatch.
//!
//! This module ties together:
//! - the build serializer (at most one build in flight, at most one rerun
//!   pending)
//! - the main runtime event loop that reacts to:
//!   - debounced file-change triggers
//!   - build completion events
//!   - lost watch handles
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

use crate::build::BuildResult;

/// Why a build was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The initial build when the session starts.
    Startup,
    /// A debounced burst of file-system events.
    FileWatch,
    /// Requested programmatically (tests, embedding callers).
    Manual,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no build is running or pending
    /// (used for `--once`).
    pub exit_when_idle: bool,
    /// Whether file watches are maintained after each build.
    pub watch: bool,
}

/// Events flowing into the runtime from the debouncer, the build backend
/// and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Something changed; a (re)build should happen.
    BuildRequested { reason: TriggerReason },
    /// A dispatched build finished, successfully or not.
    BuildCompleted {
        ticket: BuildTicket,
        result: BuildResult,
        elapsed: Duration,
    },
    /// The OS watch on `path` stopped delivering events (file deleted or
    /// renamed away).
    WatchLost { path: PathBuf },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod serializer;

pub use self::core::{CoreRuntime, SessionSummary};
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use serializer::{BuildSerializer, BuildState, BuildTicket, CompletionOutcome, RequestOutcome};
