// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing builds to the backend
//! - installing and removing file watches
//! - printing reports
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or pipelines.

use crate::build::BuildResult;
use crate::engine::event_handlers::{
    handle_build_completion, handle_build_request, handle_watch_lost, CoreStep,
};
use crate::engine::serializer::{BuildSerializer, BuildState, BuildTicket};
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Counters for one session, returned when the runtime exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub builds: u64,
    pub failures: u64,
    /// The most recent completed build and whether it succeeded.
    pub last: Option<(BuildTicket, bool)>,
}

impl SessionSummary {
    pub(crate) fn record(&mut self, ticket: BuildTicket, result: &BuildResult) {
        self.builds += 1;
        if !result.is_success() {
            self.failures += 1;
        }
        self.last = Some((ticket, result.is_success()));
    }

    /// Sequence number of the last build, if it failed.
    pub fn last_failure(&self) -> Option<u64> {
        match self.last {
            Some((ticket, false)) => Some(ticket.seq),
            _ => None,
        }
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    serializer: BuildSerializer,
    options: RuntimeOptions,
    summary: SessionSummary,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            serializer: BuildSerializer::new(),
            options,
            summary: SessionSummary::default(),
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Expose the serializer state (for tests).
    pub fn build_state(&self) -> BuildState {
        self.serializer.state()
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::BuildRequested { reason } => {
                handle_build_request(&mut self.serializer, reason)
            }
            RuntimeEvent::BuildCompleted {
                ticket,
                result,
                elapsed,
            } => handle_build_completion(
                &mut self.serializer,
                &mut self.summary,
                &self.options,
                ticket,
                result,
                elapsed,
            ),
            RuntimeEvent::WatchLost { path } => handle_watch_lost(&self.options, path),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::build::BuildError;
    use crate::engine::{CoreCommand, TriggerReason};

    fn watch_mode() -> CoreRuntime {
        CoreRuntime::new(RuntimeOptions {
            exit_when_idle: false,
            watch: true,
        })
    }

    fn request(core: &mut CoreRuntime) -> CoreStep {
        core.step(RuntimeEvent::BuildRequested {
            reason: TriggerReason::FileWatch,
        })
    }

    fn complete(core: &mut CoreRuntime, seq: u64, result: BuildResult) -> CoreStep {
        core.step(RuntimeEvent::BuildCompleted {
            ticket: BuildTicket { seq },
            result,
            elapsed: Duration::from_millis(5),
        })
    }

    fn success(deps: &[&str]) -> BuildResult {
        BuildResult::Success {
            artifact: b"a{}".to_vec(),
            dependencies: deps.iter().map(PathBuf::from).collect(),
        }
    }

    fn failure() -> BuildResult {
        BuildResult::Failure(BuildError::Compile {
            message: "boom".into(),
            location: None,
            extract: Vec::new(),
        })
    }

    fn kinds(step: &CoreStep) -> Vec<&'static str> {
        step.commands
            .iter()
            .map(|c| match c {
                CoreCommand::DispatchBuild(_) => "dispatch",
                CoreCommand::ReconcileWatches(_) => "reconcile",
                CoreCommand::RefreshWatches => "refresh",
                CoreCommand::MarkWatchLost(_) => "lost",
                CoreCommand::Report { .. } => "report",
                CoreCommand::RequestExit => "exit",
            })
            .collect()
    }

    #[test]
    fn success_reconciles_then_reports() {
        let mut core = watch_mode();
        assert_eq!(kinds(&request(&mut core)), ["dispatch"]);

        let step = complete(&mut core, 1, success(&["/p/b.less"]));
        assert_eq!(kinds(&step), ["reconcile", "report"]);
        assert!(step.keep_running);
        match &step.commands[0] {
            CoreCommand::ReconcileWatches(deps) => {
                assert_eq!(deps, &vec![PathBuf::from("/p/b.less")])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(core.build_state(), BuildState::Idle);
    }

    #[test]
    fn failure_refreshes_instead_of_reconciling() {
        let mut core = watch_mode();
        request(&mut core);
        let step = complete(&mut core, 1, failure());
        assert_eq!(kinds(&step), ["refresh", "report"]);
        assert_eq!(core.summary().failures, 1);
        assert_eq!(core.summary().last_failure(), Some(1));
    }

    #[test]
    fn requests_during_build_yield_exactly_one_rerun_after_report() {
        let mut core = watch_mode();
        request(&mut core);
        for _ in 0..5 {
            assert!(request(&mut core).commands.is_empty());
        }

        let step = complete(&mut core, 1, success(&[]));
        assert_eq!(kinds(&step), ["reconcile", "report", "dispatch"]);
        match step.commands.last() {
            Some(CoreCommand::DispatchBuild(t)) => assert_eq!(t.seq, 2),
            other => panic!("unexpected {other:?}"),
        }

        let step = complete(&mut core, 2, success(&[]));
        assert_eq!(kinds(&step), ["reconcile", "report"]);
        assert_eq!(core.summary().builds, 2);
    }

    #[test]
    fn once_mode_exits_when_idle_without_touching_watches() {
        let mut core = CoreRuntime::new(RuntimeOptions {
            exit_when_idle: true,
            watch: false,
        });
        request(&mut core);
        let step = complete(&mut core, 1, success(&["/p/x.less"]));
        assert_eq!(kinds(&step), ["report", "exit"]);
        assert!(!step.keep_running);
    }

    #[test]
    fn stale_completion_produces_nothing() {
        let mut core = watch_mode();
        let step = complete(&mut core, 7, success(&[]));
        assert!(step.commands.is_empty());
        assert_eq!(core.summary().builds, 0);
    }

    #[test]
    fn lost_watch_and_shutdown() {
        let mut core = watch_mode();
        let step = core.step(RuntimeEvent::WatchLost {
            path: PathBuf::from("/p/b.less"),
        });
        assert_eq!(kinds(&step), ["lost"]);

        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
    }
}
