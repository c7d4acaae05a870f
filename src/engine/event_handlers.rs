// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::build::BuildResult;
use crate::engine::core::SessionSummary;
use crate::engine::serializer::{BuildSerializer, BuildTicket, CompletionOutcome, RequestOutcome};
use crate::engine::{RuntimeOptions, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand this build to the backend.
    DispatchBuild(BuildTicket),
    /// Make the watch set equal to these dependencies plus the root.
    ReconcileWatches(Vec<PathBuf>),
    /// Keep the watch set as it is, but reinstall handles that were lost.
    RefreshWatches,
    /// The handle for this path no longer delivers events.
    MarkWatchLost(PathBuf),
    /// Show the outcome of a finished build.
    Report {
        ticket: BuildTicket,
        result: BuildResult,
        elapsed: Duration,
    },
    /// Request that the process exits (used for `--once` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn exit(mut commands: Vec<CoreCommand>) -> Self {
        commands.push(CoreCommand::RequestExit);
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Handle a build request.
///
/// Starts a build when idle; otherwise the request is folded into the
/// single pending rerun.
pub fn handle_build_request(serializer: &mut BuildSerializer, reason: TriggerReason) -> CoreStep {
    match serializer.request() {
        RequestOutcome::Dispatch(ticket) => {
            info!(seq = ticket.seq, ?reason, "starting build");
            CoreStep::running(vec![CoreCommand::DispatchBuild(ticket)])
        }
        RequestOutcome::Coalesced | RequestOutcome::AlreadyPending => {
            debug!(?reason, "build in flight; request coalesced");
            CoreStep::running(Vec::new())
        }
    }
}

/// Handle a finished build.
///
/// Command order matters: the watch set is brought up to date and the
/// result is reported before any queued rerun is dispatched, so the rerun
/// can never be reported ahead of the build it follows.
pub fn handle_build_completion(
    serializer: &mut BuildSerializer,
    summary: &mut SessionSummary,
    options: &RuntimeOptions,
    ticket: BuildTicket,
    result: BuildResult,
    elapsed: Duration,
) -> CoreStep {
    let outcome = serializer.complete(ticket);
    if outcome == CompletionOutcome::Stale {
        return CoreStep::running(Vec::new());
    }

    summary.record(ticket, &result);

    let mut commands = Vec::new();
    if options.watch {
        match &result {
            BuildResult::Success { dependencies, .. } => {
                commands.push(CoreCommand::ReconcileWatches(dependencies.clone()));
            }
            BuildResult::Failure(_) => commands.push(CoreCommand::RefreshWatches),
        }
    }
    commands.push(CoreCommand::Report {
        ticket,
        result,
        elapsed,
    });

    match outcome {
        CompletionOutcome::Rerun(next) => {
            commands.push(CoreCommand::DispatchBuild(next));
            CoreStep::running(commands)
        }
        _ if options.exit_when_idle => CoreStep::exit(commands),
        _ => CoreStep::running(commands),
    }
}

/// Handle a lost watch handle.
pub fn handle_watch_lost(options: &RuntimeOptions, path: PathBuf) -> CoreStep {
    if !options.watch {
        return CoreStep::running(Vec::new());
    }
    CoreStep::running(vec![CoreCommand::MarkWatchLost(path)])
}
