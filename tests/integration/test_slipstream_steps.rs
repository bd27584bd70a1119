use std::fs;
use std::path::Path;
use std::sync::Mutex;

use chainops::models::slipstream_config::SlipstreamConfig;
use chainops::services::process::{CommandOutput, CommandRunner, CommandSpec};
use chainops::services::slipstream::{
    Slipstream, SlipstreamOptions, SlipstreamSteps, DEFAULT_REPO_TAG, DEFAULT_REPO_URL,
};
use chainops::utils::error::Result;
use tempfile::TempDir;

const CONFIG: &str = r#"{
  "path_renames": {
    "ignore": {"folders": ["^target"]},
    "patterns": [{"regex": "sui", "replacement": "iota"}]
  },
  "code_renames": {
    "ignore": {"file_types": ["\\.md$"]},
    "patterns": [
      {"regex": "Sui(\\w+)", "replacement": "Iota\\1"},
      {"regex": "sui_", "replacement": "iota_"}
    ]
  },
  "overwrites": [
    {"source": "overwrites/README.md", "destination": "README.md", "min_sem_version": "1.20.0"},
    {"source": "overwrites/LEGACY.md", "destination": "LEGACY.md", "max_sem_version": "1.10.0"}
  ],
  "commands": ["cargo update -w"]
}"#;

/// Git stand-in that really moves files on `git mv` and treats files named
/// `generated.rs` as untracked.
#[derive(Default)]
struct FakeGit {
    calls: Mutex<Vec<String>>,
}

impl FakeGit {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn output(code: i32) -> CommandOutput {
        CommandOutput {
            code,
            ..CommandOutput::default()
        }
    }
}

impl CommandRunner for FakeGit {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = format!("{} {}", spec.program, spec.args.join(" "));
        self.calls.lock().unwrap().push(line.clone());

        let cwd = spec.cwd.clone().unwrap_or_default();
        if line.starts_with("git mv ") {
            if spec.args[1].ends_with("generated.rs") {
                return Ok(Self::output(128));
            }
            fs::rename(cwd.join(&spec.args[1]), cwd.join(&spec.args[2])).unwrap();
            return Ok(Self::output(0));
        }
        if line.starts_with("git ls-files") {
            return Ok(Self::output(1));
        }
        if line == "git diff --cached --quiet" {
            // always something staged
            return Ok(Self::output(1));
        }
        Ok(Self::output(0))
    }
}

fn upstream_checkout(root: &Path) {
    fs::create_dir_all(root.join("crates/sui-node/src")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::write(root.join("crates/sui-node/Cargo.toml"), "[package]\nname = \"sui-node\"\n").unwrap();
    fs::write(
        root.join("crates/sui-node/src/lib.rs"),
        "use sui_types::SuiAddress;\npub struct SuiNode;\n",
    )
    .unwrap();
    fs::write(root.join("crates/sui-node/src/generated.rs"), "// generated\n").unwrap();
    fs::write(root.join("target/debug/sui-node"), "binary").unwrap();
    fs::write(root.join("docs/Sui.md"), "SuiNode docs\n").unwrap();
    fs::write(root.join("README.md"), "upstream readme\n").unwrap();
}

fn options(config_dir: &Path, target: &Path, steps: SlipstreamSteps) -> SlipstreamOptions {
    SlipstreamOptions {
        config_dir: config_dir.to_path_buf(),
        repo_url: DEFAULT_REPO_URL.to_string(),
        repo_tag: DEFAULT_REPO_TAG.to_string(),
        version: None,
        target_folder: target.to_path_buf(),
        target_branch: None,
        patches_folder: config_dir.join("patches"),
        clone_history: false,
        commit_between_steps: true,
        panic_on_linter_errors: false,
        compare_source_folder: config_dir.to_path_buf(),
        compare_tool_binary: "meld".to_string(),
        compare_tool_arguments: String::new(),
        steps,
    }
}

#[cfg(unix)]
#[test]
fn renames_overwrites_and_commands_on_existing_checkout() {
    let config_dir = TempDir::new().unwrap();
    fs::create_dir_all(config_dir.path().join("overwrites")).unwrap();
    fs::write(config_dir.path().join("overwrites/README.md"), "fork readme\n").unwrap();
    fs::write(config_dir.path().join("overwrites/LEGACY.md"), "legacy\n").unwrap();
    fs::write(config_dir.path().join("config.json"), CONFIG).unwrap();

    let checkout = TempDir::new().unwrap();
    let target = checkout.path();
    upstream_checkout(target);
    std::os::unix::fs::symlink("../crates/sui-node/src/lib.rs", target.join("docs/node.rs")).unwrap();

    let config = SlipstreamConfig::load(&config_dir.path().join("config.json")).unwrap();
    let steps = SlipstreamSteps {
        apply_path_renames: true,
        apply_code_renames: true,
        copy_overwrites: true,
        run_shell_commands: true,
        ..SlipstreamSteps::default()
    };
    let runner = FakeGit::default();
    Slipstream::new(&runner, config, options(config_dir.path(), target, steps))
        .unwrap()
        .run()
        .unwrap();

    // paths
    assert!(target.join("crates/iota-node/Cargo.toml").is_file());
    assert!(target.join("docs/Sui.md").is_file());
    assert!(target.join("target/debug/sui-node").is_file());
    assert_eq!(fs::read_to_string(target.join("docs/Sui.md")).unwrap(), "SuiNode docs\n");
    // untracked files stay behind, keeping their folder alive
    assert!(target.join("crates/sui-node/src/generated.rs").is_file());
    assert_eq!(
        fs::read_link(target.join("docs/node.rs")).unwrap(),
        Path::new("../crates/iota-node/src/lib.rs")
    );

    // code
    assert_eq!(
        fs::read_to_string(target.join("crates/iota-node/src/lib.rs")).unwrap(),
        "use iota_types::IotaAddress;\npub struct IotaNode;\n"
    );
    assert_eq!(
        fs::read_to_string(target.join("crates/iota-node/Cargo.toml")).unwrap(),
        "[package]\nname = \"sui-node\"\n"
    );

    // overwrites honour their version window
    assert_eq!(fs::read_to_string(target.join("README.md")).unwrap(), "fork readme\n");
    assert!(!target.join("LEGACY.md").exists());

    let calls = runner.calls();
    assert!(calls.contains(&"sh -c cargo update -w".to_string()));
    let commits: Vec<_> = calls
        .iter()
        .filter_map(|c| c.strip_prefix("git commit -q -m "))
        .collect();
    assert_eq!(
        commits,
        vec![
            "fix: renamed paths",
            "fix: renamed code",
            "fix: copied overwrites",
            "fix: ran additional shell commands",
        ]
    );
}

#[test]
fn missing_target_without_clone_is_rejected() {
    let config_dir = TempDir::new().unwrap();
    let steps = SlipstreamSteps {
        apply_code_renames: true,
        ..SlipstreamSteps::default()
    };
    let runner = FakeGit::default();
    let target = config_dir.path().join("result");

    let result = Slipstream::new(&runner, SlipstreamConfig::default(), options(config_dir.path(), &target, steps))
        .unwrap()
        .run();

    assert!(result.is_err());
    assert!(runner.calls().is_empty());
}
