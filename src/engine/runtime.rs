// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::BuildBackend;
use crate::errors::Result;
use crate::report::{BuildReport, Reporter};
use crate::watch::DependencyTracker;

use super::core::{CoreRuntime, SessionSummary};
use super::{CoreCommand, RuntimeEvent};

/// Drives the build serializer in response to `RuntimeEvent`s, delegates
/// builds to a `BuildBackend`, keeps the watch set current and reports
/// results.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. It is the only owner of the tracker and the reporter,
/// so watch updates and output never race with each other.
pub struct Runtime<B: BuildBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    tracker: Option<DependencyTracker>,
    reporter: Box<dyn Reporter>,
}

impl<B: BuildBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl<B: BuildBackend> Runtime<B> {
    /// `tracker` is `None` when nothing is watched (`--once`).
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        tracker: Option<DependencyTracker>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            tracker,
            reporter,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core, in order.
    ///
    /// On exit every watch is removed. A build still in flight is not
    /// waited for; its completion event is simply never read.
    pub async fn run(mut self) -> Result<SessionSummary> {
        info!("stylewatch runtime started");

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.start();
        }

        let outcome = self.event_loop().await;

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.shutdown();
        }
        outcome?;

        let summary = self.core.summary();
        info!(
            builds = summary.builds,
            failures = summary.failures,
            "runtime exiting"
        );
        Ok(summary)
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchBuild(ticket) => {
                self.reporter.build_started(ticket);
                self.backend.dispatch(ticket).await?;
            }
            CoreCommand::ReconcileWatches(dependencies) => {
                if let Some(tracker) = self.tracker.as_mut() {
                    let changes = tracker.reconcile(&dependencies);
                    if !changes.is_empty() {
                        self.reporter.watch_changes(&changes);
                    }
                }
            }
            CoreCommand::RefreshWatches => {
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.refresh();
                }
            }
            CoreCommand::MarkWatchLost(path) => {
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.mark_lost(&path);
                }
            }
            CoreCommand::Report {
                ticket,
                result,
                elapsed,
            } => {
                info!(
                    seq = ticket.seq,
                    success = result.is_success(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "build finished"
                );
                self.reporter.report(&BuildReport::now(ticket, elapsed, result));
            }
            CoreCommand::RequestExit => {
                // keep_running is already false; nothing else to do.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
