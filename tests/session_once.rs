// tests/session_once.rs

use std::sync::Arc;

use stylewatch::errors::StylewatchError;
use stylewatch::fs::{FileSystem, RealFileSystem};
use stylewatch::run_session;
use stylewatch::types::PostProcessStep;
use stylewatch_test_utils::builders::{ConfigBuilder, TempProject};
use stylewatch_test_utils::fakes::{RecordingReporter, Reported};
use stylewatch_test_utils::{init_tracing, with_timeout};

fn real_fs() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

#[tokio::test]
async fn once_builds_writes_and_exits() {
    init_tracing();
    let project = TempProject::new();
    let input = project.write("style.less", "@import 'parts/nav';\nbody { margin: 0 }\n");
    project.write("parts/nav.less", "nav { user-select: none; }\n");

    let config = ConfigBuilder::new(&input)
        .post_process(PostProcessStep::defaults())
        .build();
    let reporter = RecordingReporter::new();

    let summary = with_timeout(run_session(config, true, real_fs(), Box::new(reporter.clone())))
        .await
        .unwrap();

    assert_eq!(summary.builds, 1);
    assert_eq!(
        project.read("style.css").unwrap(),
        "nav{-webkit-user-select:none;-moz-user-select:none;-ms-user-select:none;user-select:none}body{margin:0}"
    );
    assert_eq!(
        reporter.events(),
        vec![
            Reported::SessionStarted { watching: false },
            Reported::BuildStarted(1),
            Reported::Done(1),
        ]
    );
}

#[tokio::test]
async fn once_failure_is_an_error_and_keeps_the_old_output() {
    init_tracing();
    let project = TempProject::new();
    let input = project.write("style.less", "a { b: c; \n");
    project.write("style.css", "old");

    let config = ConfigBuilder::new(&input).build();
    let result = with_timeout(run_session(config, true, real_fs(), Box::new(RecordingReporter::new()))).await;

    match result {
        Err(StylewatchError::BuildFailed(seq)) => assert_eq!(seq, 1),
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert_eq!(project.read("style.css").unwrap(), "old");
}

#[tokio::test]
async fn missing_input_is_a_startup_error() {
    let project = TempProject::new();
    let config = ConfigBuilder::new(project.path("nope.less")).build();
    let reporter = RecordingReporter::new();

    let err = run_session(config, true, real_fs(), Box::new(reporter.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, StylewatchError::InputMissing(_)));
    assert!(err.to_string().starts_with("File does not exist: "));
    assert!(reporter.events().is_empty());
}

#[tokio::test]
async fn css_input_gets_a_min_css_output() {
    let project = TempProject::new();
    let input = project.write("site.css", "a  {  color : red ; }\n");
    let config = ConfigBuilder::new(&input).minify().build();
    assert_eq!(config.output, project.path("site.min.css"));

    with_timeout(run_session(config, true, real_fs(), Box::new(RecordingReporter::new())))
        .await
        .unwrap();

    assert_eq!(project.read("site.min.css").unwrap(), "a{color:red}");
    assert_eq!(project.read("site.css").unwrap(), "a  {  color : red ; }\n");
}
