// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod report;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::info;

use crate::build::{BuildPipeline, PipelineBackend};
use crate::cli::CliArgs;
use crate::config::{load_optional, Config};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, SessionSummary, TriggerReason};
use crate::errors::{Result, StylewatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::{ConsoleReporter, Reporter};
use crate::watch::{spawn_debouncer, ContentFilter, DependencyTracker, ExcludeMatcher, NotifyWatchBackend};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the startup input check
/// - the build pipeline and its backend
/// - (optional) file watcher, debouncer and dependency tracker
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<SessionSummary> {
    let cwd = std::env::current_dir()?;
    let file = load_optional(args.config.as_deref(), &cwd)?;
    let config = Config::resolve(file.as_ref(), &args, &cwd)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let reporter = Box::new(ConsoleReporter::stdio(&cwd));
    run_session(config, args.once, fs, reporter).await
}

/// Run one session for an already resolved `config`.
///
/// With `once`, a single build runs and no watches are installed; a failed
/// build then surfaces as [`StylewatchError::BuildFailed`].
pub async fn run_session(
    config: Config,
    once: bool,
    fs: Arc<dyn FileSystem>,
    mut reporter: Box<dyn Reporter>,
) -> Result<SessionSummary> {
    if !fs.is_file(&config.input) {
        return Err(StylewatchError::InputMissing(config.input.clone()));
    }
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        debounce_ms = config.debounce.as_millis() as u64,
        steps = ?config.post_process.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        once,
        "starting session"
    );

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let pipeline = BuildPipeline::from_config(&config, Arc::clone(&fs));
    let backend = PipelineBackend::new(pipeline, rt_tx.clone());

    // File watching (disabled in --once mode).
    let tracker = if once {
        None
    } else {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let watch_backend = NotifyWatchBackend::new(raw_tx)?;
        let base = config.input.parent().unwrap_or_else(|| Path::new(""));
        let exclude = ExcludeMatcher::new(base, &config.watch.exclude)?;
        let filter = config
            .watch
            .use_hash
            .then(|| ContentFilter::new(Arc::clone(&fs)));
        spawn_debouncer(config.debounce, raw_rx, rt_tx.clone(), filter);
        Some(DependencyTracker::new(
            &config.input,
            exclude,
            Box::new(watch_backend),
        ))
    };

    reporter.session_started(&config.input, &config.output, !once);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    rt_tx
        .send(RuntimeEvent::BuildRequested {
            reason: TriggerReason::Startup,
        })
        .await
        .map_err(|e| anyhow!("failed to queue startup build: {e}"))?;

    let options = RuntimeOptions {
        exit_when_idle: once,
        watch: !once,
    };
    let core = CoreRuntime::new(options);
    let summary = Runtime::new(core, rt_rx, backend, tracker, reporter)
        .run()
        .await?;

    if once {
        if let Some(seq) = summary.last_failure() {
            return Err(StylewatchError::BuildFailed(seq));
        }
    }
    Ok(summary)
}
