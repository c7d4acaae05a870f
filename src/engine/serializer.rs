// src/engine/serializer.rs

use tracing::{debug, warn};

/// Identifies one build attempt. Sequence numbers start at 1 and grow by one
/// per dispatched build, whatever its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildTicket {
    pub seq: u64,
}

/// Build lifecycle as seen by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    #[default]
    Idle,
    Running,
    /// A build is running and at least one request arrived meanwhile.
    RunningWithPendingRerun,
}

/// What the caller must do after [`BuildSerializer::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nothing was running: start this build now.
    Dispatch(BuildTicket),
    /// A build is running; one rerun is now pending.
    Coalesced,
    /// A rerun was already pending; this request adds nothing.
    AlreadyPending,
}

/// What the caller must do after [`BuildSerializer::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Nothing pending; the serializer is idle again.
    Idle,
    /// Requests arrived during the finished build: start this one now.
    Rerun(BuildTicket),
    /// The completion did not match the in-flight build and was ignored.
    Stale,
}

/// Guarantees at most one build in flight and collapses any number of
/// requests made during a build into a single follow-up build.
///
/// Semantics:
/// - `Idle` + request → dispatch, `Running`.
/// - `Running` + request → `RunningWithPendingRerun`.
/// - `RunningWithPendingRerun` + request → unchanged.
/// - completion while `Running` → `Idle`.
/// - completion while `RunningWithPendingRerun` → dispatch the rerun,
///   `Running`.
///
/// A request is therefore never lost: either it starts a build, or a build
/// that starts after it is guaranteed to follow.
#[derive(Debug, Default)]
pub struct BuildSerializer {
    state: BuildState,
    in_flight: Option<BuildTicket>,
    last_seq: u64,
}

impl BuildSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == BuildState::Idle
    }

    pub fn in_flight(&self) -> Option<BuildTicket> {
        self.in_flight
    }

    /// Number of builds dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.last_seq
    }

    pub fn request(&mut self) -> RequestOutcome {
        match self.state {
            BuildState::Idle => {
                let ticket = self.start_next();
                debug!(seq = ticket.seq, "build dispatched");
                RequestOutcome::Dispatch(ticket)
            }
            BuildState::Running => {
                self.state = BuildState::RunningWithPendingRerun;
                debug!("build running; rerun queued");
                RequestOutcome::Coalesced
            }
            BuildState::RunningWithPendingRerun => RequestOutcome::AlreadyPending,
        }
    }

    pub fn complete(&mut self, ticket: BuildTicket) -> CompletionOutcome {
        if self.in_flight != Some(ticket) {
            warn!(
                seq = ticket.seq,
                in_flight = ?self.in_flight.map(|t| t.seq),
                "ignoring completion for a build that is not in flight"
            );
            return CompletionOutcome::Stale;
        }

        match self.state {
            BuildState::RunningWithPendingRerun => {
                let next = self.start_next();
                debug!(finished = ticket.seq, seq = next.seq, "starting queued rerun");
                CompletionOutcome::Rerun(next)
            }
            _ => {
                self.state = BuildState::Idle;
                self.in_flight = None;
                CompletionOutcome::Idle
            }
        }
    }

    fn start_next(&mut self) -> BuildTicket {
        self.last_seq += 1;
        let ticket = BuildTicket { seq: self.last_seq };
        self.state = BuildState::Running;
        self.in_flight = Some(ticket);
        ticket
    }
}
