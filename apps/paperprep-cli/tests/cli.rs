use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn paperprep(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_paperprep"));
    cmd.current_dir(dir.path()).env("RUST_LOG", "warn").env_remove("APP_USE_FAKE_MARKUP");
    cmd
}

#[test]
fn chunk_reads_stdin_and_prints_json_strings() {
    let tmp = TempDir::new().unwrap();
    let mut child = paperprep(&tmp)
        .args(["chunk", "--chunk-size", "10", "--chunk-overlap", "5"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"one, two [4] three: four five").unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let lines: Vec<String> = String::from_utf8(out.stdout).unwrap().lines().map(String::from).collect();
    assert_eq!(lines, vec![r#""one two""#, r#""two three""#, r#""three four""#, r#""four five""#]);
}

#[test]
fn run_writes_records_and_reports_skips() {
    let tmp = TempDir::new().unwrap();
    let papers = tmp.path().join("papers");
    fs::create_dir(&papers).unwrap();
    fs::write(papers.join("a.txt"), "Shrimp ponds (Lee et al., 2018) need aeration.").unwrap();
    fs::write(papers.join("b.pdf"), "not really a pdf").unwrap();
    fs::write(papers.join("c.md"), "Tilapia thrive.").unwrap();

    let out = paperprep(&tmp).args(["run", "papers", "-o", "out/records.jsonl"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary = String::from_utf8(out.stdout).unwrap();
    assert!(summary.contains("3 documents: 2 succeeded"), "{summary}");
    assert!(summary.contains("skipped b"), "{summary}");

    let records = fs::read_to_string(tmp.path().join("out/records.jsonl")).unwrap();
    let lines: Vec<&str> = records.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        r#"{"title":"","author":"","creationDate":"","subject":"","keywords":"","format":"Plain Text","text":["Shrimp ponds need aeration"]}"#
    );
    assert!(lines[1].contains(r#""format":"Markdown","text":["Tilapia thrive"]"#));
}

#[test]
fn fail_fast_and_bad_config_exit_non_zero() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.pdf"), "garbage").unwrap();
    let out = paperprep(&tmp).args(["run", "broken.pdf", "--fail-fast"]).output().unwrap();
    assert!(!out.status.success());

    fs::write(tmp.path().join("config.toml"), "[pipeline]\nchunk_size = 10\nchunk_overlap = 10\n").unwrap();
    let out = paperprep(&tmp).args(["chunk"]).stdin(Stdio::null()).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid chunk configuration"));
}
