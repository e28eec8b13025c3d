//! CLI tests: render frames to image files and scan them with the binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

use framescan::Frame;
use framescan::test_utils::{invert_frame, qr_frame, solid_frame};

fn write_png(dir: &tempfile::TempDir, name: &str, frame: &Frame) -> PathBuf {
    let path = dir.path().join(name);
    image::save_buffer(
        &path,
        frame.pixels(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
    )
    .unwrap();
    path
}

fn framescan() -> Command {
    Command::cargo_bin("framescan").unwrap()
}

#[test]
fn decodes_a_png_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(&dir, "code.png", &qr_frame("CLI-TEST", 240, 240));

    framescan()
        .arg(&png)
        .assert()
        .success()
        .stdout(predicate::str::contains("CLI-TEST"));
}

#[test]
fn blank_image_exits_one_with_a_miss_line() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(&dir, "blank.png", &solid_frame(64, 64, 255));

    framescan()
        .arg(&png)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no code found"));
}

#[test]
fn missing_file_exits_two_and_reports_on_stderr() {
    framescan()
        .arg("does-not-exist.png")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.png"));
}

#[test]
fn json_mode_emits_one_parseable_report_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let code = write_png(&dir, "code.png", &qr_frame("CLI-JSON", 240, 240));
    let blank = write_png(&dir, "blank.png", &solid_frame(64, 64, 255));

    let assert = framescan()
        .arg("--json")
        .arg(&code)
        .arg(&blank)
        .assert()
        .code(1);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let reports: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reports.len(), 2);

    assert_eq!(reports[0]["found"], true);
    assert_eq!(reports[0]["text"], "CLI-JSON");
    assert_eq!(reports[0]["corners"].as_array().unwrap().len(), 4);
    assert!(reports[0]["elapsed_ms"].is_number());

    assert_eq!(reports[1]["found"], false);
    assert!(reports[1].get("text").is_none());
}

#[test]
fn pinned_inversion_strategy_decodes_inverted_codes() {
    let dir = tempfile::tempdir().unwrap();
    let inverted = invert_frame(&qr_frame("FLIPPED", 200, 200));
    let png = write_png(&dir, "inverted.png", &inverted);

    // the default chain reaches attempt-both on retries and still finds it
    framescan()
        .arg(&png)
        .assert()
        .success()
        .stdout(predicate::str::contains("FLIPPED"));

    // pinning dont-invert everywhere turns the same file into a miss
    framescan()
        .arg("--inversion")
        .arg("dont-invert")
        .arg(&png)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no code found"));
}
