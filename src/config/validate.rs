// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, StylewatchError};
use crate::types::PostProcessStep;

/// Upper bound for the debounce window; anything longer is almost certainly a
/// unit mistake (seconds typed as milliseconds the other way round).
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StylewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.build, raw.watch, raw.postprocess))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ms) = cfg.build.debounce_ms {
        validate_debounce_ms(ms)?;
    }
    validate_paths(cfg)?;
    if let Some(steps) = &cfg.postprocess {
        validate_post_process(steps)?;
    }
    validate_exclude_patterns(&cfg.watch.exclude)?;
    Ok(())
}

pub fn validate_debounce_ms(ms: u64) -> Result<()> {
    if ms == 0 || ms > MAX_DEBOUNCE_MS {
        return Err(StylewatchError::ConfigError(format!(
            "debounce_ms must be between 1 and {MAX_DEBOUNCE_MS} (got {ms})"
        )));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in [("input", &cfg.build.input), ("output", &cfg.build.output)] {
        if let Some(v) = value {
            if v.trim().is_empty() {
                return Err(StylewatchError::ConfigError(format!(
                    "[build].{key} must not be empty"
                )));
            }
        }
    }
    Ok(())
}

/// Check that the post-process chain can be applied in a meaningful order.
///
/// Each step may appear at most once, and prefixing must run before
/// minification.
pub fn validate_post_process(steps: &[PostProcessStep]) -> Result<()> {
    let mut seen_prefix = false;
    let mut seen_minify = false;

    for step in steps {
        match step {
            PostProcessStep::Prefix { targets } => {
                if seen_prefix {
                    return Err(StylewatchError::ConfigError(
                        "post-process step 'prefix' listed more than once".to_string(),
                    ));
                }
                if seen_minify {
                    return Err(StylewatchError::ConfigError(
                        "post-process step 'prefix' must come before 'minify'".to_string(),
                    ));
                }
                if targets.iter().any(|t| t.trim().is_empty()) {
                    return Err(StylewatchError::ConfigError(
                        "post-process step 'prefix' has an empty entry in `targets`".to_string(),
                    ));
                }
                seen_prefix = true;
            }
            PostProcessStep::Minify { .. } => {
                if seen_minify {
                    return Err(StylewatchError::ConfigError(
                        "post-process step 'minify' listed more than once".to_string(),
                    ));
                }
                seen_minify = true;
            }
        }
    }

    Ok(())
}

fn validate_exclude_patterns(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        Glob::new(pattern).map_err(|e| {
            StylewatchError::ConfigError(format!(
                "[watch].exclude has invalid glob '{pattern}': {e}"
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).expect("test TOML must parse")
    }

    #[test]
    fn empty_file_is_valid() {
        let cfg = ConfigFile::try_from(raw("")).unwrap();
        assert!(cfg.postprocess.is_none());
        assert!(cfg.watch.exclude.is_empty());
    }

    #[test]
    fn minify_before_prefix_is_rejected() {
        let err = ConfigFile::try_from(raw(
            r#"
[[postprocess]]
name = "minify"

[[postprocess]]
name = "prefix"
"#,
        ))
        .unwrap_err();

        match err {
            StylewatchError::ConfigError(msg) => assert!(msg.contains("before 'minify'")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_steps_are_rejected() {
        let err = ConfigFile::try_from(raw(
            r#"
[[postprocess]]
name = "minify"

[[postprocess]]
name = "minify"
aggressive = true
"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let err = ConfigFile::try_from(raw("[build]\ndebounce_ms = 0\n")).unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn bad_exclude_glob_is_rejected() {
        let err = ConfigFile::try_from(raw("[watch]\nexclude = [\"vendor/[\"]\n")).unwrap_err();
        assert!(err.to_string().contains("invalid glob"));
    }

    #[test]
    fn unknown_step_name_fails_to_parse() {
        let res: std::result::Result<RawConfigFile, _> =
            toml::from_str("[[postprocess]]\nname = \"uglify\"\n");
        assert!(res.is_err());
    }
}
