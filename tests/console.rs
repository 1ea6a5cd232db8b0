//! Integration tests for the `console` binary commands that need no database.

use assert_cmd::Command;
use predicates::prelude::*;

fn console_cmd() -> Command {
    Command::cargo_bin("console").expect("console binary not found")
}

#[test]
fn debug_json_points_at_the_reported_column() {
    console_cmd()
        .args(["debug", "json", "--line", "2", "--column", "5", "--payload", "{\n\"a\" 1\n}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\" 1\n    ^"));
}

#[test]
fn debug_json_outside_the_payload_is_reported() {
    console_cmd()
        .args(["debug", "json", "--line", "9", "--column", "1", "--payload", "{}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outside of the payload"));
}

#[test]
fn template_import_requires_a_file() {
    console_cmd()
        .args(["template", "import"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--file"));
}

#[test]
fn template_import_rejects_malformed_yaml_before_touching_the_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("template.yaml");
    std::fs::write(&file, "slug: root\nsteps: [\n").unwrap();

    console_cmd()
        .args(["template", "import", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid template"));
}
