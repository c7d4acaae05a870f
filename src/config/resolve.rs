// src/config/resolve.rs

//! Merge a validated [`ConfigFile`] with CLI flags into the immutable
//! [`Config`] snapshot the rest of the program reads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{validate_debounce_ms, validate_post_process};
use crate::errors::Result;
use crate::types::PostProcessStep;
use crate::watch::path_utils::normalize_path;

/// Root stylesheet used when neither the CLI nor the config names one.
pub const DEFAULT_INPUT: &str = "style.less";

/// Debounce window used when neither the CLI nor the config sets one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Resolved, read-only options for one watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute path of the root stylesheet.
    pub input: PathBuf,
    /// Absolute path of the artifact to write.
    pub output: PathBuf,
    /// Quiet period after the last raw change before a rebuild is requested.
    pub debounce: Duration,
    /// Post-processing steps, in application order.
    pub post_process: Vec<PostProcessStep>,
    pub watch: WatchSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSettings {
    /// Globs relative to the input's directory that are never watched.
    pub exclude: Vec<String>,
    pub use_hash: bool,
}

impl Config {
    /// Build the session config.
    ///
    /// CLI paths are relative to `cwd`; paths from the file are relative to
    /// the file's directory. CLI flags win over file values.
    pub fn resolve(file: Option<&ConfigFile>, args: &CliArgs, cwd: &Path) -> Result<Config> {
        let file_dir = file
            .and_then(|f| f.base_dir())
            .map(|d| cwd.join(d))
            .unwrap_or_else(|| cwd.to_path_buf());

        let input = match (&args.input, file.and_then(|f| f.build.input.as_ref())) {
            (Some(cli), _) => normalize_path(&cwd.join(cli)),
            (None, Some(from_file)) => normalize_path(&file_dir.join(from_file)),
            (None, None) => normalize_path(&cwd.join(DEFAULT_INPUT)),
        };

        let output = match (&args.output, file.and_then(|f| f.build.output.as_ref())) {
            (Some(cli), _) => normalize_path(&cwd.join(cli)),
            (None, Some(from_file)) => normalize_path(&file_dir.join(from_file)),
            (None, None) => default_output_path(&input),
        };

        let debounce_ms = args
            .debounce_ms
            .or_else(|| file.and_then(|f| f.build.debounce_ms))
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        validate_debounce_ms(debounce_ms)?;

        let base_steps = file
            .and_then(|f| f.postprocess.clone())
            .unwrap_or_else(PostProcessStep::defaults);
        let post_process = apply_cli_overrides(base_steps, args);
        validate_post_process(&post_process)?;

        let watch = WatchSettings {
            exclude: file.map(|f| f.watch.exclude.clone()).unwrap_or_default(),
            use_hash: args.use_hash || file.is_some_and(|f| f.watch.use_hash),
        };

        Ok(Config {
            input,
            output,
            debounce: Duration::from_millis(debounce_ms),
            post_process,
            watch,
        })
    }
}

fn apply_cli_overrides(mut steps: Vec<PostProcessStep>, args: &CliArgs) -> Vec<PostProcessStep> {
    if args.no_prefix {
        steps.retain(|s| !matches!(s, PostProcessStep::Prefix { .. }));
    } else if let Some(list) = &args.prefix_browsers {
        let cli_targets: Vec<String> = list
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let step = PostProcessStep::Prefix {
            targets: cli_targets,
        };
        match steps
            .iter()
            .position(|s| matches!(s, PostProcessStep::Prefix { .. }))
        {
            Some(idx) => steps[idx] = step,
            None => steps.insert(0, step),
        }
    }

    if args.no_compact {
        steps.retain(|s| !matches!(s, PostProcessStep::Minify { .. }));
    } else if args.aggressive {
        for step in steps.iter_mut() {
            if let PostProcessStep::Minify { aggressive } = step {
                *aggressive = true;
            }
        }
    }

    steps
}

/// Default output location for `input`.
///
/// `dir/name.less` becomes `dir/name.css`. An input that is already CSS
/// would otherwise map onto `name.css.css`; that case becomes
/// `name.min.css` so the input is never overwritten.
pub fn default_output_path(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = file_name.strip_suffix(".less").unwrap_or(&file_name);
    let mut out = format!("{stem}.css");

    if out.to_lowercase().ends_with(".css.css") {
        out.truncate(out.len() - ".css.css".len());
        out.push_str(".min.css");
    }

    dir.join(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    fn file(toml_src: &str) -> ConfigFile {
        let raw: RawConfigFile = toml::from_str(toml_src).unwrap();
        ConfigFile::try_from(raw).unwrap().with_base_dir("conf")
    }

    #[test]
    fn default_output_replaces_less_extension() {
        assert_eq!(
            default_output_path(Path::new("/p/style.less")),
            PathBuf::from("/p/style.css")
        );
    }

    #[test]
    fn default_output_for_css_input_is_min_css() {
        assert_eq!(
            default_output_path(Path::new("/p/site.css")),
            PathBuf::from("/p/site.min.css")
        );
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let cfg = Config::resolve(None, &CliArgs::default(), Path::new("/work")).unwrap();
        assert_eq!(cfg.input, PathBuf::from("/work/style.less"));
        assert_eq!(cfg.output, PathBuf::from("/work/style.css"));
        assert_eq!(cfg.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));
        assert_eq!(cfg.post_process, PostProcessStep::defaults());
        assert!(!cfg.watch.use_hash);
    }

    #[test]
    fn file_paths_are_relative_to_the_file() {
        let f = file("[build]\ninput = \"less/app.less\"\noutput = \"../dist/app.css\"\n");
        let cfg = Config::resolve(Some(&f), &CliArgs::default(), Path::new("/work")).unwrap();
        assert_eq!(cfg.input, PathBuf::from("/work/conf/less/app.less"));
        assert_eq!(cfg.output, PathBuf::from("/work/dist/app.css"));
    }

    #[test]
    fn cli_flags_override_the_file() {
        let f = file(
            r#"
[build]
input = "a.less"
debounce_ms = 900

[[postprocess]]
name = "prefix"
targets = ["firefox 50"]

[[postprocess]]
name = "minify"
"#,
        );
        let args = CliArgs {
            input: Some("b.less".into()),
            debounce_ms: Some(250),
            prefix_browsers: Some("ie 11, safari 9".into()),
            no_compact: true,
            ..CliArgs::default()
        };

        let cfg = Config::resolve(Some(&f), &args, Path::new("/work")).unwrap();
        assert_eq!(cfg.input, PathBuf::from("/work/b.less"));
        assert_eq!(cfg.debounce, Duration::from_millis(250));
        assert_eq!(
            cfg.post_process,
            vec![PostProcessStep::Prefix {
                targets: vec!["ie 11".into(), "safari 9".into()]
            }]
        );
    }

    #[test]
    fn no_prefix_and_aggressive() {
        let args = CliArgs {
            no_prefix: true,
            aggressive: true,
            ..CliArgs::default()
        };
        let cfg = Config::resolve(None, &args, Path::new("/w")).unwrap();
        assert_eq!(
            cfg.post_process,
            vec![PostProcessStep::Minify { aggressive: true }]
        );
    }

    #[test]
    fn out_of_range_cli_debounce_is_rejected() {
        let args = CliArgs {
            debounce_ms: Some(0),
            ..CliArgs::default()
        };
        assert!(Config::resolve(None, &args, Path::new("/w")).is_err());
    }
}
