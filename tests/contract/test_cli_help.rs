use assert_cmd::Command;
use predicates::prelude::*;

/// Contract tests for the top-level `chainops` surface

#[test]
fn test_help_lists_every_tool() {
    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cargo-sort"))
        .stdout(predicate::str::contains("keystores"))
        .stdout(predicate::str::contains("genesis"))
        .stdout(predicate::str::contains("slipstream"))
        .stdout(predicate::str::contains("search-versions"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chainops"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.arg("deploy").assert().failure().code(2);
}

#[test]
fn test_search_tests_requires_regex() {
    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.arg("search-tests")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--regex"));
}
