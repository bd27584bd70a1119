use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `chainops rename`

fn fork() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("crates/sui-core/src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("lib.rs"),
        "// SPDX-License-Identifier: Apache-2.0\n\nuse sui_types::base;\nconst SUITE: &str = \"testsuite\";\n",
    )
    .unwrap();
    temp_dir
}

#[test]
fn test_rename_dry_run_leaves_tree_untouched() {
    let temp_dir = fork();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["rename", "-p"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("< use sui_types::base;"))
        .stdout(predicate::str::contains("> use iota_types::base;"))
        .stdout(predicate::str::contains("IGNORE_LIST"))
        .stdout(predicate::str::contains("dry run:"));

    assert!(temp_dir.path().join("crates/sui-core/src/lib.rs").is_file());
    assert!(!temp_dir.path().join("crates/iota-core").exists());
}

#[test]
fn test_rename_execute_rewrites_and_moves() {
    let temp_dir = fork();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["rename", "--execute", "-p"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("applied:"));

    let moved = temp_dir.path().join("crates/iota-core/src/lib.rs");
    let content = fs::read_to_string(moved).unwrap();
    assert!(content.contains("use iota_types::base;"));
    assert!(content.contains("\"testsuite\""));
    assert!(content.contains("// Modifications Copyright (c) 2024 IOTA Stiftung\n"));
    assert!(!temp_dir.path().join("crates/sui-core").exists());
}

#[test]
fn test_rename_honors_gitignore() {
    let temp_dir = fork();
    fs::write(temp_dir.path().join(".gitignore"), "target/\n").unwrap();
    let target = temp_dir.path().join("target");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("sui.txt"), "use sui;\n").unwrap();

    let mut cmd = Command::cargo_bin("chainops").unwrap();
    cmd.args(["rename", "--execute", "-p"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignored paths:"))
        .stdout(predicate::str::contains("sui.txt"));

    // Ignored files keep their content; path renames still apply
    let renamed = temp_dir.path().join("target/iota.txt");
    assert_eq!(fs::read_to_string(renamed).unwrap(), "use sui;\n");
}
