// src/config/mod.rs

//! Configuration loading and validation for stylewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like post-process ordering (`validate.rs`).
//! - Merge the file with CLI flags into one immutable [`Config`]
//!   snapshot (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_optional};
pub use model::{BuildSection, ConfigFile, RawConfigFile, WatchSection};
pub use resolve::{default_output_path, Config, WatchSettings, DEFAULT_DEBOUNCE_MS, DEFAULT_INPUT};
