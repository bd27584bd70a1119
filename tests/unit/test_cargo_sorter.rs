use std::fs;
use std::path::Path;

use chainops::services::cargo_sorter::{discover_internal_crates, CargoSortOptions, CargoSorter};
use chainops::services::process::RecordingRunner;
use tempfile::TempDir;

const ALPHA: &str = "\
[package]
name = \"alpha\"
version = \"0.1.0\"

[dependencies]
serde = \"1\"
beta = { path = \"../b\" }
iota-sdk = { package = \"iota-rust-sdk\", git = \"https://example.com/sdk\" }
anyhow = \"1\"
";

const ALPHA_SORTED: &str = "\
[package]
name = \"alpha\"
version = \"0.1.0\"

[dependencies]
# external dependencies
anyhow = \"1\"
serde = \"1\"

# internal dependencies
beta = { path = \"../b\" }
iota-sdk = { package = \"iota-rust-sdk\", git = \"https://example.com/sdk\" }
";

const BETA: &str = "\
[package]
name = \"beta\"
version = \"0.1.0\"

[dependencies]
anyhow = \"1\"
";

const VENDORED: &str = "[package]\nname = \"vendored\"\n\n[dependencies]\nzz = \"1\"\naa = \"1\"\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "crates/a/Cargo.toml", ALPHA);
    write(dir.path(), "crates/b/Cargo.toml", BETA);
    write(dir.path(), "external-crates/vendored/Cargo.toml", VENDORED);
    dir
}

fn options(target: &Path, check: bool) -> CargoSortOptions {
    CargoSortOptions {
        target: target.to_path_buf(),
        extra_internal: vec!["iota-rust-sdk".to_string()],
        ignored_folders: vec!["external-crates".to_string()],
        check,
        run_dprint: true,
    }
}

#[test]
fn test_discover_internal_crates() {
    let dir = workspace();
    let names: Vec<String> = discover_internal_crates(dir.path()).unwrap().into_iter().collect();
    assert_eq!(names, vec!["alpha", "beta", "vendored"]);
}

#[test]
fn test_sort_tree_and_run_dprint() {
    let dir = workspace();
    let runner = RecordingRunner::new();

    let report = CargoSorter::new(options(dir.path(), false), &runner).run().unwrap();

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.changed, vec![dir.path().join("crates/a/Cargo.toml")]);
    assert_eq!(report.skipped_dirs, vec![dir.path().join("external-crates")]);

    assert_eq!(fs::read_to_string(dir.path().join("crates/a/Cargo.toml")).unwrap(), ALPHA_SORTED);
    assert_eq!(fs::read_to_string(dir.path().join("crates/b/Cargo.toml")).unwrap(), BETA);
    assert_eq!(
        fs::read_to_string(dir.path().join("external-crates/vendored/Cargo.toml")).unwrap(),
        VENDORED
    );

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "dprint");
    assert_eq!(calls[0].args, vec!["fmt"]);
    assert_eq!(calls[0].cwd.as_deref(), Some(dir.path()));
}

#[test]
fn test_check_mode_reports_without_writing() {
    let dir = workspace();
    let runner = RecordingRunner::new();

    let report = CargoSorter::new(options(dir.path(), true), &runner).run().unwrap();

    assert_eq!(report.changed.len(), 1);
    assert_eq!(fs::read_to_string(dir.path().join("crates/a/Cargo.toml")).unwrap(), ALPHA);
    assert!(runner.calls().is_empty());
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = workspace();
    let runner = RecordingRunner::new();
    let mut opts = options(dir.path(), false);
    opts.run_dprint = false;

    CargoSorter::new(opts.clone(), &runner).run().unwrap();
    let report = CargoSorter::new(opts, &runner).run().unwrap();

    assert!(report.changed.is_empty());
    assert!(runner.calls().is_empty());
}

#[test]
fn test_invalid_ignore_regex_is_an_error() {
    let dir = workspace();
    let runner = RecordingRunner::new();
    let mut opts = options(dir.path(), false);
    opts.ignored_folders = vec!["(".to_string()];

    let err = CargoSorter::new(opts, &runner).run().unwrap_err();
    assert!(err.to_string().starts_with("Invalid regex"));
}
