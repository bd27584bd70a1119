use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `chainops search-tests` and `chainops search-versions`

fn source_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let crate_dir = temp_dir.path().join("crates/checkpoints");
    fs::create_dir_all(crate_dir.join("src")).unwrap();
    fs::write(
        crate_dir.join("Cargo.toml"),
        "[package]\nname = \"checkpoints\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();
    fs::write(
        crate_dir.join("src/lib.rs"),
        "\
pub struct CheckpointV2;

#[cfg(test)]
mod tests {
    #[test]
    fn builds_checkpoint() {
        let _ = super::CheckpointV2;
    }

    #[tokio::test]
    async fn unrelated() {
        run().await;
    }
}
",
    )
    .unwrap();
    temp_dir
}

#[test]
fn test_search_tests_writes_output_file() {
    let temp_dir = source_tree();
    let output = temp_dir.path().join("tests.txt");

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["search-tests", "--regex", "CHECKPOINTV\\d", "--verbose", "--target"])
        .arg(temp_dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("builds_checkpoint"))
        .stdout(predicate::str::contains("unrelated").not());

    let written = fs::read_to_string(output).unwrap();
    assert!(written.starts_with("builds_checkpoint\n    "));
    assert!(written.ends_with("lib.rs:6\n"));
}

#[test]
fn test_search_tests_rejects_invalid_regex() {
    let temp_dir = source_tree();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["search-tests", "--regex", "(unclosed", "--target"])
        .arg(temp_dir.path())
        .arg("--output")
        .arg(temp_dir.path().join("out.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("regex"));
}

#[test]
fn test_search_versions_reports_crates() {
    let temp_dir = source_tree();
    let output = temp_dir.path().join("versions.txt");

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["search-versions", "--target"])
        .arg(temp_dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("CheckpointV2"))
        .stdout(predicate::str::contains("checkpoints"));

    let written = fs::read_to_string(output).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next().unwrap(),
        format!("{:90}: 1 occurrence(s)", "CheckpointV2")
    );
    assert!(lines.next().unwrap().ends_with("lib.rs, line 1"));
    assert_eq!(
        lines.next().unwrap(),
        format!("{:90}: 1 occurrence(s)", "super::CheckpointV2")
    );
}
