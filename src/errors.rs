// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only startup and configuration problems surface as `StylewatchError`.
//! Everything that goes wrong inside a single build is a
//! [`crate::build::BuildError`] carried by the build result instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StylewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("build #{0} failed")]
    BuildFailed(u64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StylewatchError>;
