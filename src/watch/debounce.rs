// src/watch/debounce.rs

//! Collapse bursts of raw file events into single build requests.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::cache::ContentFilter;
use crate::watch::watcher::{ChangeKind, RawChange};

/// Trailing-edge debouncer.
///
/// Every raw event pushes the deadline to `now + window`; a trigger fires
/// once the deadline passes with no further events. The type is pure: the
/// caller supplies the clock.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn on_raw_event(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Returns true exactly once per quiet period, when `now` has reached
    /// the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Spawn the task that turns [`RawChange`]s into runtime events.
///
/// - `Removed` changes are forwarded immediately as `WatchLost`.
/// - Every admitted change restarts the debounce window; when it expires a
///   single `BuildRequested` is sent.
/// - With a [`ContentFilter`], modifications that leave the file content
///   unchanged are dropped before they reach the debouncer.
///
/// The task ends when either channel closes.
pub fn spawn_debouncer(
    window: Duration,
    mut raw_rx: mpsc::UnboundedReceiver<RawChange>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut filter: Option<ContentFilter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(window);
        info!(window_ms = window.as_millis() as u64, "debouncer started");

        loop {
            // The sleep branch is disabled while nothing is pending, but its
            // future is still built, so it needs some instant.
            let wake_at = debouncer
                .deadline()
                .unwrap_or_else(|| Instant::now() + window);

            tokio::select! {
                maybe_change = raw_rx.recv() => {
                    let Some(change) = maybe_change else {
                        debug!("raw event channel closed");
                        break;
                    };
                    debug!(path = %change.path.display(), kind = ?change.kind, "raw file event");

                    if change.kind == ChangeKind::Removed
                        && runtime_tx
                            .send(RuntimeEvent::WatchLost { path: change.path.clone() })
                            .await
                            .is_err()
                    {
                        break;
                    }

                    if let Some(filter) = filter.as_mut() {
                        if !filter.admit(&change).await {
                            continue;
                        }
                    }
                    debouncer.on_raw_event(Instant::now());
                }
                _ = sleep_until(wake_at), if debouncer.is_pending() => {
                    if debouncer.poll(Instant::now()) {
                        debug!("quiet period elapsed; requesting build");
                        let event = RuntimeEvent::BuildRequested {
                            reason: TriggerReason::FileWatch,
                        };
                        if runtime_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        debug!("debouncer finished");
    })
}
