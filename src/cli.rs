// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stylewatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "stylewatch",
    version,
    about = "Compile a stylesheet and its imports, rebuilding whenever any of them change.",
    long_about = None
)]
pub struct CliArgs {
    /// Root stylesheet to compile.
    ///
    /// Default: `[build].input` from the config file, else `style.less`.
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// Where to write the compiled CSS.
    ///
    /// Default: next to the input, with a `.css` extension.
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Disable vendor prefixing.
    #[arg(long)]
    pub no_prefix: bool,

    /// Comma-separated browser targets for prefixing, e.g. "last 2 versions, ie 11".
    #[arg(long, value_name = "LIST")]
    pub prefix_browsers: Option<String>,

    /// Disable minification of the output.
    #[arg(long)]
    pub no_compact: bool,

    /// Let the minifier also drop empty rules and unit-less zeros.
    #[arg(long)]
    pub aggressive: bool,

    /// Build once and exit, without watching.
    #[arg(long)]
    pub once: bool,

    /// Quiet period (milliseconds) after the last change before rebuilding.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Ignore change events that leave a file's contents untouched.
    #[arg(long)]
    pub use_hash: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `stylewatch.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STYLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
