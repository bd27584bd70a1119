// `cargo tree` invocation and parsing into the internal crate graph

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::codeowners::CodeOwners;
use crate::models::dependency_graph::{Crate, DependencyGraph};
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::Result;
use crate::utils::fs_utils;

const DEPTH_MARKERS: [&str; 4] = ["│   ", "├── ", "└── ", "    "];
const DEV_SECTION: &str = "[dev-dependencies]";

fn tree_glyphs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[├─└│ ]+\s*").expect("static regex"))
}

fn version_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" v[0-9]+\.[0-9]+\.[0-9]+.*").expect("static regex"))
}

fn parenthesized() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((.*?)\)").expect("static regex"))
}

pub fn run_cargo_tree(
    runner: &dyn CommandRunner,
    base: &Path,
    skip_dev_dependencies: bool,
    save_to: Option<&Path>,
) -> Result<String> {
    let edges = if skip_dev_dependencies {
        "--edges=no-build,no-dev"
    } else {
        "--edges=no-build"
    };
    let spec = CommandSpec::new("cargo")
        .args(["tree", "-q", "--all-features", "--no-dedupe", "--depth=1", edges])
        .current_dir(base)
        .captured();
    let output = runner.run(&spec)?;

    if let Some(path) = save_to {
        fs_utils::write_string(path, &output.stdout)?;
    }
    Ok(output.stdout)
}

/// Indentation depth of a `cargo tree` line with the default prefix.
pub fn depth(line: &str) -> usize {
    DEPTH_MARKERS.iter().map(|m| line.matches(m).count()).sum()
}

/// A package line of a workspace crate living under `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub path: String,
}

impl PackageInfo {
    /// `None` for external packages.
    pub fn parse(line: &str, base: &str) -> Option<Self> {
        let info = tree_glyphs().replace(line.trim(), "");
        if !info.contains(&format!("({base}")) || info.contains("external-crates/") {
            return None;
        }
        let name = version_suffix().replace(&info, "").trim().to_string();
        let path = parenthesized()
            .captures(&info)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace(base, ""))
            .unwrap_or_default();
        Some(Self { name, path })
    }
}

pub fn parse_cargo_tree(
    output: &str,
    base: &str,
    owners: Option<&CodeOwners>,
    skip_dev_dependencies: bool,
) -> DependencyGraph {
    let lines: Vec<&str> = output.split('\n').collect();
    let mut graph = DependencyGraph::new();

    for line in &lines {
        if depth(line) != 0 {
            continue;
        }
        if let Some(info) = PackageInfo::parse(line, base) {
            let owner = owners.map(|o| o.owner_of(&info.path));
            graph.insert(Crate::new(info.name, owner));
        }
    }

    let mut stack: Vec<String> = Vec::new();
    let mut dev_depth: Option<usize> = None;

    for line in &lines {
        let d = depth(line);

        if line.contains(DEV_SECTION) {
            if dev_depth.map_or(true, |current| d < current) {
                dev_depth = Some(d);
            }
            continue;
        }
        if dev_depth.is_some_and(|current| d <= current) {
            dev_depth = None;
        }
        if dev_depth.is_some() && skip_dev_dependencies {
            continue;
        }

        let Some(info) = PackageInfo::parse(line, base) else {
            continue;
        };

        if d == 0 {
            stack = vec![info.name];
            continue;
        }

        let Some(parent) = stack.get(d - 1).cloned() else {
            tracing::warn!(line = line.trim(), "dependency without parent crate");
            continue;
        };
        if let Some(krate) = graph.get_mut(&parent) {
            krate.add_dependency(&info.name, dev_depth.is_some());
        }
        if d < stack.len() {
            stack[d] = info.name;
        } else {
            stack.push(info.name);
        }
    }

    graph
}
