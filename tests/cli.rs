//! Binary-surface smoke tests. These only cover paths that fail before any
//! browser interaction, so they run anywhere.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn unparseable_url_exits_nonzero() {
    Command::cargo_bin("yt-transcript")
        .unwrap()
        .arg("https://example.com/page")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse video ID"));
}

#[test]
fn unparseable_url_json_output_carries_error() {
    let output = Command::cargo_bin("yt-transcript")
        .unwrap()
        .args(["https://example.com/page", "--json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["success"], false);
    assert!(doc["error"]
        .as_str()
        .unwrap()
        .contains("Could not parse video ID"));
}

#[test]
fn stdin_mode_reads_url() {
    Command::cargo_bin("yt-transcript")
        .unwrap()
        .arg("--stdin")
        .write_stdin("https://example.com/page\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse video ID"));
}

#[test]
fn missing_url_exits_with_usage_error() {
    Command::cargo_bin("yt-transcript")
        .unwrap()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No URL provided"));
}

#[test]
fn help_renders() {
    Command::cargo_bin("yt-transcript")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Show transcript"));
}
