use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const SCENARIO_A: &str = r#"{
  "name": "A",
  "objective": {
    "direction": 2,
    "name": "obj",
    "vars": [{ "name": "x", "coef": 3 }, { "name": "y", "coef": 2 }]
  },
  "subjectTo": [{
    "name": "cap",
    "vars": [{ "name": "x", "coef": 1 }, { "name": "y", "coef": 1 }],
    "bnds": { "type": 3, "lb": 0, "ub": 4 }
  }]
}"#;

fn problem_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

fn lpkit() -> Command {
    let mut cmd = Command::cargo_bin("lpkit").expect("lpkit binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn solve_prints_result_object() {
    let file = problem_file(SCENARIO_A);
    let output = lpkit()
        .arg("solve")
        .arg(file.path())
        .output()
        .expect("run lpkit");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["status"], 5);
    assert!((value["z"].as_f64().unwrap() - 12.0).abs() < 1e-9);
    assert!((value["vars"]["x"].as_f64().unwrap() - 4.0).abs() < 1e-9);
    assert!(value["glpk_version"].is_string());
    assert!(value["time"].is_number());
    assert!(value.get("rows").is_none());
}

#[test]
fn solve_reads_stdin_with_rows() {
    lpkit()
        .args(["solve", "-", "--rows", "--pretty"])
        .write_stdin(SCENARIO_A)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows\"").and(predicate::str::contains("\n")));
}

#[test]
fn solve_incrementally() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .arg("solve")
        .arg(file.path())
        .args(["--increment", "1", "--msg-level", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":5"))
        .stderr(predicate::str::contains("round"));
}

#[test]
fn malformed_spec_fails_with_field_name() {
    let file = problem_file(r#"{ "name": "broken", "subjectTo": [] }"#);
    lpkit()
        .arg("solve")
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("objective"));
}

#[test]
fn parse_error_reports_position() {
    let file = problem_file("{\n  \"name\": \n}");
    lpkit()
        .args(["check"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn missing_file_fails() {
    lpkit()
        .args(["solve", "/nonexistent/problem.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}

#[test]
fn invalid_message_level_fails() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .arg("solve")
        .arg(file.path())
        .args(["--msg-level", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid message level"));
}

#[test]
fn write_prints_lp_text() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .arg("write")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Maximize\n obj: + 3 x + 2 y\n"))
        .stdout(predicate::str::contains(" cap: + x + y <= 4\n"))
        .stdout(predicate::str::ends_with("End\n"));
}

#[test]
fn check_prints_statistics() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .arg("check")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Kind: LP"))
        .stdout(predicate::str::contains("Columns: 2"))
        .stdout(predicate::str::contains("Non-zeros: 2"));
}

#[test]
fn version_prints_crate_version() {
    lpkit()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn unknown_log_format_is_rejected() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .args(["--log-format", "xml", "check"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'xml'"));
}

#[test]
fn json_log_format_writes_json_lines() {
    let file = problem_file(SCENARIO_A);
    lpkit()
        .args(["--log-format", "json", "solve"])
        .arg(file.path())
        .args(["--msg-level", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("{\"timestamp\""));
}

#[test]
fn integral_float_codes_are_accepted() {
    let file = problem_file(&SCENARIO_A.replace("\"direction\": 2", "\"direction\": 2.0"));
    lpkit()
        .arg("check")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Kind: LP"));
}
