// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, StylewatchError};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// Relative paths inside the file are later resolved against the file's own
/// directory, which is recorded on the returned [`ConfigFile`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_base_dir(config_dir(path)))
}

/// Load the config file the user asked for, or the default one if it exists.
///
/// - An explicit path must exist.
/// - The default path (`stylewatch.toml` in `cwd`) is optional.
pub fn load_optional(explicit: Option<&str>, cwd: &Path) -> Result<Option<ConfigFile>> {
    match explicit {
        Some(p) => {
            let path = cwd.join(p);
            if !path.is_file() {
                return Err(StylewatchError::ConfigError(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            load_and_validate(&path).map(Some)
        }
        None => {
            let path = cwd.join(default_config_path());
            if path.is_file() {
                load_and_validate(&path).map(Some)
            } else {
                Ok(None)
            }
        }
    }
}

/// Default config file name, looked up in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("stylewatch.toml")
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
