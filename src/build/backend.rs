// src/build/backend.rs

//! Pluggable build backend.
//!
//! The runtime hands each dispatched [`BuildTicket`] to a `BuildBackend`
//! instead of running the pipeline itself, so the event loop keeps
//! draining file-change events while a build is in flight.
//!
//! - [`PipelineBackend`] runs the real [`BuildPipeline`] on Tokio's blocking
//!   pool and posts a `BuildCompleted` event when it is done.
//! - Tests provide their own backend that records tickets and completes
//!   them on demand.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::build::{BuildError, BuildPipeline, BuildResult};
use crate::engine::{BuildTicket, RuntimeEvent};
use crate::errors::Result;

/// How dispatched builds get executed.
pub trait BuildBackend: Send {
    /// Start the build for `ticket`.
    ///
    /// Must return without waiting for the build. Exactly one
    /// `RuntimeEvent::BuildCompleted` carrying `ticket` has to reach the
    /// runtime later, whatever the outcome.
    fn dispatch(
        &mut self,
        ticket: BuildTicket,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend around [`BuildPipeline`].
#[derive(Debug)]
pub struct PipelineBackend {
    pipeline: BuildPipeline,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineBackend {
    pub fn new(pipeline: BuildPipeline, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            pipeline,
            runtime_tx,
        }
    }
}

impl BuildBackend for PipelineBackend {
    fn dispatch(
        &mut self,
        ticket: BuildTicket,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let pipeline = self.pipeline.clone();
        let runtime_tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(run_build(pipeline, ticket, runtime_tx));
            Ok(())
        })
    }
}

/// Run one pipeline attempt and report it.
///
/// A panic inside the pipeline is turned into a failed build so the
/// runtime always sees a completion for the ticket.
async fn run_build(
    pipeline: BuildPipeline,
    ticket: BuildTicket,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let started = Instant::now();
    debug!(seq = ticket.seq, "build started");

    let result = match tokio::task::spawn_blocking(move || pipeline.run()).await {
        Ok(result) => result,
        Err(join_err) => {
            error!(seq = ticket.seq, error = %join_err, "build task aborted");
            BuildResult::Failure(BuildError::Compile {
                message: format!("build aborted: {join_err}"),
                location: None,
                extract: Vec::new(),
            })
        }
    };
    let elapsed = started.elapsed();

    debug!(
        seq = ticket.seq,
        success = result.is_success(),
        elapsed_ms = elapsed.as_millis() as u64,
        "sending BuildCompleted event to runtime"
    );
    if runtime_tx
        .send(RuntimeEvent::BuildCompleted {
            ticket,
            result,
            elapsed,
        })
        .await
        .is_err()
    {
        debug!(seq = ticket.seq, "runtime gone; dropping build result");
    }
}
