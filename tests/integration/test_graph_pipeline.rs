use std::fs;
use std::path::Path;
use std::sync::Mutex;

use chainops::services::graph_renderer::{GraphGenerator, GraphOptions};
use chainops::services::process::{CommandOutput, CommandRunner, CommandSpec};
use chainops::utils::error::Result;
use tempfile::TempDir;

/// Answers `cargo tree` with a canned workspace and turns every `dot`
/// call into a minimal SVG with one node per crate named in the DOT file.
struct FakeToolchain {
    tree: String,
    calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
    fn new(tree: String) -> Self {
        Self {
            tree,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn svg_for(dot: &str) -> String {
    let mut svg = String::from("<svg>\n<g id=\"graph0\" class=\"graph\">\n");
    let mut index = 1;
    for line in dot.lines() {
        let line = line.trim();
        if line.contains("->") || !line.starts_with('"') {
            continue;
        }
        let name = line.trim_start_matches('"').split('"').next().unwrap_or_default();
        svg.push_str(&format!(
            "<g id=\"node{index}\" class=\"node\">\n<title>{name}</title>\n<text>{name}</text>\n</g>\n"
        ));
        index += 1;
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

impl CommandRunner for FakeToolchain {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", spec.program, spec.args.join(" ")));
        let stdout = match spec.program.as_str() {
            "cargo" => self.tree.clone(),
            "dot" => {
                let input = Path::new(&spec.args[1]);
                let output = Path::new(&spec.args[3]);
                fs::write(output, svg_for(&fs::read_to_string(input).unwrap())).unwrap();
                String::new()
            }
            _ => String::new(),
        };
        Ok(CommandOutput {
            code: 0,
            stdout,
            stderr: String::new(),
        })
    }
}

fn workspace() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let github = dir.path().join(".github");
    fs::create_dir_all(&github).unwrap();
    fs::write(github.join("CODEOWNERS"), "* @org/all\n/crates/iota-node @org/node\n").unwrap();

    let base = fs::canonicalize(dir.path()).unwrap().display().to_string();
    let tree = format!(
        "iota-node v0.1.0 ({base}/crates/iota-node)
├── iota-config v0.1.0 ({base}/crates/iota-config)
└── serde v1.0.190
[dev-dependencies]
└── iota-test v0.1.0 ({base}/crates/iota-test)

iota-config v0.1.0 ({base}/crates/iota-config)
└── iota-types v0.1.0 ({base}/crates/iota-types)

iota-types v0.1.0 ({base}/crates/iota-types)

iota-test v0.1.0 ({base}/crates/iota-test)
"
    );
    (dir, tree)
}

fn options(base: &Path, target: &Path) -> GraphOptions {
    GraphOptions {
        target_folder: target.to_path_buf(),
        base_path: base.to_path_buf(),
        skip_dev_dependencies: false,
        codeowners: None,
        format: "svg".to_string(),
        keep_dot: false,
        save_tree: None,
    }
}

#[test]
fn svg_pipeline_links_nodes_and_writes_index() {
    let (base, tree) = workspace();
    let out = TempDir::new().unwrap();
    let target = out.path().join("graphs");
    let runner = FakeToolchain::new(tree);

    let graph = GraphGenerator::new(&runner, options(base.path(), &target)).run().unwrap();

    assert_eq!(graph.len(), 4);
    let node = graph.get("iota-node").unwrap();
    assert_eq!(node.owner.as_deref(), Some("@org/node"));
    assert_eq!(graph.get("iota-types").unwrap().owner.as_deref(), Some("@org/all"));
    assert!(node.dependencies.iter().any(|d| d.name == "iota-test" && d.is_dev));
    assert!(!node.dependencies.iter().any(|d| d.name == "serde"));

    let calls = runner.calls();
    assert!(calls[0].starts_with("cargo tree -q --all-features --no-dedupe --depth=1 --edges=no-build"));
    // one dot call per graph: all plus direct and full per crate
    assert_eq!(calls.iter().filter(|c| c.starts_with("dot -Tsvg")).count(), 9);

    assert!(!target.join("all.dot").exists());
    let direct = fs::read_to_string(target.join("iota-config.svg")).unwrap();
    assert!(direct.contains("<a href=\"javascript:history.back()\">"));
    assert!(direct.contains("<a href=\"iota-types.svg\">"));
    let full = fs::read_to_string(target.join("iota-node_full.svg")).unwrap();
    assert!(full.contains("<a href=\"iota-types_full.svg\">"));

    let index = fs::read_to_string(target.join("index.html")).unwrap();
    assert!(index.contains("<h1>IOTA-Rebased Dependency Graphs</h1>"));
    assert!(index.contains("<li><a href=\"iota-config_full.svg\">iota-config_full</a></li>"));
}

#[test]
fn skipping_dev_dependencies_and_keeping_dot_files() {
    let (base, tree) = workspace();
    let out = TempDir::new().unwrap();
    let target = out.path().join("graphs");
    let saved_tree = out.path().join("tree.txt");
    let runner = FakeToolchain::new(tree.clone());

    let mut options = options(base.path(), &target);
    options.skip_dev_dependencies = true;
    options.keep_dot = true;
    options.format = "png".to_string();
    options.save_tree = Some(saved_tree.clone());

    let graph = GraphGenerator::new(&runner, options).run().unwrap();

    let node = graph.get("iota-node").unwrap();
    assert!(node.dependencies.iter().all(|d| d.name != "iota-test"));
    assert!(runner.calls()[0].contains("--edges=no-build,no-dev"));

    assert_eq!(fs::read_to_string(saved_tree).unwrap(), tree);
    let all = fs::read_to_string(target.join("all.dot")).unwrap();
    assert!(all.contains("\"iota-node\" -> \"iota-config\";"));
    assert!(!target.join("index.html").exists());
}

#[test]
fn missing_base_path_is_an_error() {
    let out = TempDir::new().unwrap();
    let runner = FakeToolchain::new(String::new());
    let missing = out.path().join("does-not-exist");

    let result = GraphGenerator::new(&runner, options(&missing, &out.path().join("graphs"))).run();
    assert!(result.is_err());
    assert!(runner.calls().is_empty());
}
