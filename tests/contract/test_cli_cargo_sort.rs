use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `chainops cargo-sort`

const UNSORTED: &str = "\
[package]
name = \"alpha\"

[dependencies]
serde = \"1\"
beta = { path = \"../beta\" }
anyhow = \"1\"
";

const SORTED: &str = "\
[package]
name = \"alpha\"

[dependencies]
# external dependencies
anyhow = \"1\"
serde = \"1\"

# internal dependencies
beta = { path = \"../beta\" }
";

fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let alpha = temp_dir.path().join("crates/alpha");
    let beta = temp_dir.path().join("crates/beta");
    fs::create_dir_all(&alpha).unwrap();
    fs::create_dir_all(&beta).unwrap();
    fs::write(alpha.join("Cargo.toml"), UNSORTED).unwrap();
    fs::write(beta.join("Cargo.toml"), "[package]\nname = \"beta\"\n").unwrap();
    temp_dir
}

#[test]
fn test_cargo_sort_rewrites_manifests() {
    let temp_dir = workspace();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["cargo-sort", "--skip-dprint", "--target"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 Cargo.toml file(s) processed, 1 changed"));

    let sorted = fs::read_to_string(temp_dir.path().join("crates/alpha/Cargo.toml")).unwrap();
    assert_eq!(sorted, SORTED);
}

#[test]
fn test_cargo_sort_check_reports_without_writing() {
    let temp_dir = workspace();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["cargo-sort", "--skip-dprint", "--check", "--target"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("would sort"))
        .stderr(predicate::str::contains("Error: 1 Cargo.toml file(s) are not sorted"));

    let untouched = fs::read_to_string(temp_dir.path().join("crates/alpha/Cargo.toml")).unwrap();
    assert_eq!(untouched, UNSORTED);
}

#[test]
fn test_cargo_sort_check_passes_on_sorted_tree() {
    let temp_dir = workspace();
    fs::write(temp_dir.path().join("crates/alpha/Cargo.toml"), SORTED).unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["cargo-sort", "--skip-dprint", "--check", "--target"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 changed"));
}

#[test]
fn test_cargo_sort_skips_ignored_folders() {
    let temp_dir = workspace();
    let external = temp_dir.path().join("external-crates/move");
    fs::create_dir_all(&external).unwrap();
    fs::write(external.join("Cargo.toml"), UNSORTED).unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["cargo-sort", "--skip-dprint", "--target"])
        .arg(temp_dir.path())
        .assert()
        .success();

    let untouched = fs::read_to_string(external.join("Cargo.toml")).unwrap();
    assert_eq!(untouched, UNSORTED);
}
