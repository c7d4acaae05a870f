//! Test doubles for the seams the runtime talks through.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use tokio::sync::mpsc;
use stylewatch::build::{BuildBackend, BuildError, BuildResult, CompileOutput, Compiler};
use stylewatch::engine::{BuildTicket, RuntimeEvent};
use stylewatch::errors::Result;
use stylewatch::report::{BuildReport, Reporter};
use stylewatch::watch::{WatchBackend, WatchChanges};

type ResultFn = Arc<dyn Fn(BuildTicket) -> BuildResult + Send + Sync>;

/// A build backend that never touches a pipeline.
///
/// - `immediate` mode answers every dispatch with a `BuildCompleted` built
///   by the given closure.
/// - `manual` mode only records tickets; the test sends the completion
///   itself, so it controls exactly when a build "finishes".
pub struct FakeBuildBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<BuildTicket>>>,
    results: Option<ResultFn>,
}

impl FakeBuildBackend {
    pub fn immediate<F>(runtime_tx: mpsc::Sender<RuntimeEvent>, results: F) -> Self
    where
        F: Fn(BuildTicket) -> BuildResult + Send + Sync + 'static,
    {
        Self {
            runtime_tx,
            dispatched: Arc::default(),
            results: Some(Arc::new(results)),
        }
    }

    pub fn manual(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            dispatched: Arc::default(),
            results: None,
        }
    }

    /// Shared view of every ticket dispatched so far.
    pub fn dispatched(&self) -> Arc<Mutex<Vec<BuildTicket>>> {
        Arc::clone(&self.dispatched)
    }
}

impl BuildBackend for FakeBuildBackend {
    fn dispatch(
        &mut self,
        ticket: BuildTicket,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let results = self.results.clone();

        Box::pin(async move {
            dispatched.lock().unwrap().push(ticket);
            if let Some(results) = results {
                let result = (*results)(ticket);
                // Spawned so the runtime never blocks on its own channel.
                tokio::spawn(async move {
                    let _ = tx
                        .send(RuntimeEvent::BuildCompleted {
                            ticket,
                            result,
                            elapsed: Duration::from_millis(1),
                        })
                        .await;
                });
            }
            Ok(())
        })
    }
}

/// Successful result with the given dependencies.
pub fn success(deps: &[&Path]) -> BuildResult {
    BuildResult::Success {
        artifact: b"/* ok */".to_vec(),
        dependencies: deps.iter().map(|p| p.to_path_buf()).collect(),
    }
}

/// Compile failure without a location.
pub fn compile_failure(message: &str) -> BuildResult {
    BuildResult::Failure(BuildError::Compile {
        message: message.to_string(),
        location: None,
        extract: Vec::new(),
    })
}

/// Watch backend that keeps the active set in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingWatchBackend {
    active: Arc<Mutex<BTreeSet<PathBuf>>>,
    failing: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl RecordingWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> BTreeSet<PathBuf> {
        self.active.lock().unwrap().clone()
    }

    /// Make `watch(path)` fail until [`Self::heal`] is called.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Simulate the OS dropping a handle (e.g. the file was deleted).
    pub fn drop_handle(&self, path: &Path) {
        self.active.lock().unwrap().remove(path);
    }
}

impl WatchBackend for RecordingWatchBackend {
    fn watch(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            bail!("cannot watch {}", path.display());
        }
        self.active.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> anyhow::Result<()> {
        if !self.active.lock().unwrap().remove(path) {
            bail!("{} is not watched", path.display());
        }
        Ok(())
    }
}

/// What a [`RecordingReporter`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reported {
    SessionStarted { watching: bool },
    BuildStarted(u64),
    Done(u64),
    Failed { seq: u64, message: String },
    WatchChanges(WatchChanges),
}

/// Reporter that records events instead of printing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<Reported>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Reported> {
        self.events.lock().unwrap().clone()
    }

    /// Sequence numbers of finished builds, successful or not.
    pub fn finished(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Reported::Done(seq) | Reported::Failed { seq, .. } => Some(seq),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Reported::Done(_)))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Reported::Failed { .. }))
            .count()
    }

    fn push(&self, event: Reported) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn session_started(&mut self, _input: &Path, _output: &Path, watching: bool) {
        self.push(Reported::SessionStarted { watching });
    }

    fn build_started(&mut self, ticket: BuildTicket) {
        self.push(Reported::BuildStarted(ticket.seq));
    }

    fn report(&mut self, report: &BuildReport) {
        match &report.result {
            BuildResult::Success { .. } => self.push(Reported::Done(report.seq)),
            BuildResult::Failure(err) => self.push(Reported::Failed {
                seq: report.seq,
                message: err.to_string(),
            }),
        }
    }

    fn watch_changes(&mut self, changes: &WatchChanges) {
        self.push(Reported::WatchChanges(changes.clone()));
    }
}

/// Wraps a compiler, sleeping inside every compile and recording how many
/// compiles overlapped and what source each one saw.
#[derive(Debug)]
pub struct SlowCompiler<C> {
    inner: C,
    delay: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
    sources: Mutex<Vec<String>>,
}

impl<C: Compiler> SlowCompiler<C> {
    pub fn new(inner: C, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// Root sources seen by each compile, in order.
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

impl<C: Compiler> Compiler for SlowCompiler<C> {
    fn compile(&self, path: &Path, source: &str) -> std::result::Result<CompileOutput, BuildError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source.to_string());

        // Runs on the blocking pool.
        std::thread::sleep(self.delay);
        let out = self.inner.compile(path, source);

        self.running.fetch_sub(1, Ordering::SeqCst);
        out
    }
}
