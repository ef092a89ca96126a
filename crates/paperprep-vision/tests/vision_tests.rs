#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use paperprep_core::config::VisionSettings;
use paperprep_core::traits::MarkupModel;
use paperprep_core::Error;
use paperprep_vision::{get_default_model, CommandMarkupModel, DisabledMarkupModel, FakeMarkupModel};

fn sh(script: &str) -> Vec<String> {
    // With `sh -c`, the appended image path becomes $0.
    vec!["sh".into(), "-c".into(), script.into()]
}

fn figure(tmp: &TempDir, contents: &str) -> PathBuf {
    let path = tmp.path().join("paper.table1.png");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn command_stdout_becomes_markup() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "  <table><tr><td>pH</td><td>7.4</td></tr></table>\n");
    let model = CommandMarkupModel::new(&sh("cat \"$0\"")).unwrap();
    assert_eq!(model.image_to_markup(&image).unwrap(), "<table><tr><td>pH</td><td>7.4</td></tr></table>");
}

#[test]
fn failing_or_silent_command_is_unavailable() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "ignored");
    for script in ["exit 3", "true"] {
        let err = CommandMarkupModel::new(&sh(script)).unwrap().image_to_markup(&image).unwrap_err();
        assert!(matches!(err, Error::InferenceUnavailable(_)), "{script}: {err:?}");
    }

    let missing = CommandMarkupModel::new(&["paperprep-no-such-converter".to_string()]).unwrap();
    assert!(matches!(missing.image_to_markup(&image), Err(Error::InferenceUnavailable(_))));
}

#[test]
fn slow_command_is_killed_at_timeout() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "ignored");
    let model = CommandMarkupModel::new(&sh("sleep 10")).unwrap().with_timeout(Some(Duration::from_millis(200)));
    let started = Instant::now();
    let err = model.image_to_markup(&image).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(err.to_string().contains("timed out after 200ms"), "{err}");
}

#[test]
fn timed_out_command_is_killed_before_it_finishes() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "ignored");
    let marker = tmp.path().join("paper.table1.png.done");
    let model = CommandMarkupModel::new(&sh("sleep 1; touch \"$0.done\"; echo late")).unwrap().with_timeout(Some(Duration::from_millis(100)));

    assert!(model.image_to_markup(&image).is_err());
    std::thread::sleep(Duration::from_millis(1500));
    assert!(!marker.exists(), "converter kept running after the timeout");
}

#[test]
fn runs_from_blocking_threads_of_either_runtime_flavor() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "<table>pooled</table>");
    let model = CommandMarkupModel::new(&sh("cat \"$0\"")).unwrap();

    let multi = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();
    let current = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    for runtime in [multi, current] {
        let (model, image) = (model.clone(), image.clone());
        let markup = runtime.block_on(async move { tokio::task::spawn_blocking(move || model.image_to_markup(&image)).await.unwrap() });
        assert_eq!(markup.unwrap(), "<table>pooled</table>");
    }
}

#[test]
fn empty_command_is_invalid_config() {
    assert!(matches!(CommandMarkupModel::new(&[]), Err(Error::InvalidConfig(_))));
}

#[test]
fn fake_and_disabled_models() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "png bytes");
    let fake = FakeMarkupModel.image_to_markup(&image).unwrap();
    assert_eq!(fake, FakeMarkupModel.image_to_markup(&image).unwrap());
    assert!(fake.starts_with("<table>") && fake.contains("paper.table1"));
    assert!(FakeMarkupModel.image_to_markup(&tmp.path().join("missing.png")).is_err());
    assert!(matches!(DisabledMarkupModel.image_to_markup(&image), Err(Error::InferenceUnavailable(_))));
}

#[test]
fn default_model_follows_settings() {
    let tmp = TempDir::new().unwrap();
    let image = figure(&tmp, "<table>from command</table>");

    let fake = get_default_model(&VisionSettings { use_fake: true, ..Default::default() }).unwrap();
    assert!(fake.image_to_markup(&image).unwrap().contains("placeholder"));

    let command = get_default_model(&VisionSettings { command: sh("cat \"$0\""), ..Default::default() }).unwrap();
    assert_eq!(command.image_to_markup(&image).unwrap(), "<table>from command</table>");
}
