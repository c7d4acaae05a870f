// src/report.rs

//! User-facing status output.
//!
//! Logs go to stderr through `tracing`; the lines a user actually watches
//! for (`Done [ #3 - ... ]`, compile errors, watch changes) go through a
//! [`Reporter`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::build::{BuildError, BuildResult};
use crate::engine::BuildTicket;
use crate::watch::path_utils::display_relative;
use crate::watch::WatchChanges;

/// Everything the reporter needs about one finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub seq: u64,
    pub timestamp: DateTime<Local>,
    pub elapsed: Duration,
    pub result: BuildResult,
}

impl BuildReport {
    pub fn now(ticket: BuildTicket, elapsed: Duration, result: BuildResult) -> Self {
        Self {
            seq: ticket.seq,
            timestamp: Local::now(),
            elapsed,
            result,
        }
    }
}

pub trait Reporter: Send {
    /// Called once before the first build.
    fn session_started(&mut self, input: &Path, output: &Path, watching: bool);
    fn build_started(&mut self, ticket: BuildTicket);
    fn report(&mut self, report: &BuildReport);
    /// Only called with non-empty changes.
    fn watch_changes(&mut self, changes: &WatchChanges);
}

/// Reporter that writes plain text lines. Successes and watch changes go to
/// `out`, failures to `err`. Write errors are ignored.
#[derive(Debug)]
pub struct ConsoleReporter<O = io::Stdout, E = io::Stderr> {
    base: PathBuf,
    out: O,
    err: E,
}

impl ConsoleReporter {
    /// Reporter on stdout/stderr, printing paths relative to `base`.
    pub fn stdio(base: impl Into<PathBuf>) -> Self {
        Self::with_writers(base, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn with_writers(base: impl Into<PathBuf>, out: O, err: E) -> Self {
        Self {
            base: base.into(),
            out,
            err,
        }
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn relative(&self, path: &Path) -> String {
        display_relative(&self.base, path)
    }

    fn write_failure(&mut self, report: &BuildReport, error: &BuildError) {
        let mut text = format!("Error: {error}\n");
        if let BuildError::Compile {
            location: Some(location),
            extract,
            ..
        } = error
        {
            let file = self.relative(&location.file);
            text.push_str(&format!("At {file}:{}:{}\n", location.line, location.column));
            for line in extract {
                text.push_str(&format!("> {line}\n"));
            }
        }
        text.push_str(&format!("Failed [ #{} - {} ]\n", report.seq, stamp(report)));
        let _ = self.err.write_all(text.as_bytes());
        let _ = self.err.flush();
    }
}

impl<O: Write + Send, E: Write + Send> Reporter for ConsoleReporter<O, E> {
    fn session_started(&mut self, input: &Path, output: &Path, watching: bool) {
        let input = self.relative(input);
        let output = self.relative(output);
        let _ = writeln!(self.out, "Input: {input}");
        let _ = writeln!(self.out, "Output: {output}");
        if watching {
            let _ = writeln!(self.out, "Watching...");
        }
        let _ = self.out.flush();
    }

    fn build_started(&mut self, _ticket: BuildTicket) {
        let _ = writeln!(self.out, "Compiling...");
        let _ = self.out.flush();
    }

    fn report(&mut self, report: &BuildReport) {
        match &report.result {
            BuildResult::Success { .. } => {
                let _ = writeln!(self.out, "Compilation: {}ms", report.elapsed.as_millis());
                let _ = writeln!(self.out, "Done [ #{} - {} ]", report.seq, stamp(report));
                let _ = self.out.flush();
            }
            BuildResult::Failure(error) => self.write_failure(report, error),
        }
    }

    fn watch_changes(&mut self, changes: &WatchChanges) {
        let mut text = String::new();
        if !changes.added.is_empty() {
            text.push_str("Added:\n");
            for path in &changes.added {
                text.push_str(&self.relative(path));
                text.push('\n');
            }
        }
        if !changes.removed.is_empty() {
            text.push_str("Removed:\n");
            for path in &changes.removed {
                text.push_str(&self.relative(path));
                text.push('\n');
            }
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

fn stamp(report: &BuildReport) -> impl std::fmt::Display + '_ {
    report.timestamp.format("%Y-%m-%d %H:%M:%S")
}
