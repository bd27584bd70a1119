// DOT rendering, graphviz conversion and SVG navigation for crate graphs

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Local;
use regex::{Captures, Regex};

use crate::models::codeowners::CodeOwners;
use crate::models::dependency_graph::{Crate, Dependency, DependencyGraph};
use crate::services::cargo_tree::{parse_cargo_tree, run_cargo_tree};
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

pub const DEFAULT_INDEX_TITLE: &str = "IOTA-Rebased Dependency Graphs";

const LEGEND: &str = r#"
    // Legend
    subgraph cluster_legend {
        style = "dashed";
        rankdir = LR;

        legend_parent [label="PARENTS", shape=plaintext, fontcolor=blue, fontsize=10, fontname="Helvetica-Bold", width=0, height=0];
        legend_root [label="ROOT CRATE", shape=plaintext, fontcolor=green, fontsize=10, fontname="Helvetica-Bold", width=0, height=0];
        legend_normal [label="NORMAL DEPENDENCY", shape=plaintext, fontcolor=black, fontsize=10, fontname="Helvetica-Bold", width=0, height=0];
        legend_no_dep [label="CRATE WITHOUT DEPENDENCIES", shape=plaintext, fontcolor=red, fontsize=10, fontname="Helvetica-Bold", width=0, height=0];
        legend_dev [label="DEV-DEPENDENCY", shape=plaintext, fontcolor=orange, fontsize=10, fontname="Helvetica-Bold", width=0, height=0];

        legend_parent -> legend_root [style=invis, weight=1];
        legend_root -> legend_normal [style=invis, weight=1];
        legend_normal -> legend_no_dep [style=invis, weight=1];
        legend_no_dep -> legend_dev [style=invis, weight=1];
    }
}
"#;

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn label(name: &str, owner: Option<&str>) -> String {
    match owner {
        Some(owner) => format!("{}\\n({})", escape_dot(name), escape_dot(owner)),
        None => escape_dot(name),
    }
}

/// Wrap node and edge statements into a complete DOT document.
pub fn dot_document(body: &str) -> String {
    format!("digraph dependencies {{\n    rankdir=LR;\n{body}{LEGEND}")
}

pub struct DotWriter<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> DotWriter<'g> {
    pub const fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    fn owner(&self, name: &str) -> Option<&'g str> {
        self.graph.get(name).and_then(|c| c.owner.as_deref())
    }

    fn color(&self, dependency: &Dependency) -> &'static str {
        if dependency.is_dev {
            "orange"
        } else if self.graph.is_leaf(&dependency.name) {
            "red"
        } else {
            "black"
        }
    }

    fn node(out: &mut String, name: &str, owner: Option<&str>, color: Option<&str>) {
        let _ = write!(out, "    \"{}\" [label=\"{}\"", escape_dot(name), label(name, owner));
        if let Some(color) = color {
            let _ = write!(out, ", fontcolor={color}");
        }
        out.push_str("];\n");
    }

    fn edge(out: &mut String, from: &str, to: &str) {
        let _ = writeln!(out, "    \"{}\" -> \"{}\";", escape_dot(from), escape_dot(to));
    }

    /// Every crate and every edge in one graph.
    pub fn all(&self) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();

        for krate in self.graph.crates() {
            if seen.insert(krate.name.as_str()) {
                Self::node(&mut out, &krate.name, krate.owner.as_deref(), None);
            }
            for dependency in &krate.dependencies {
                if seen.insert(dependency.name.as_str()) {
                    Self::node(
                        &mut out,
                        &dependency.name,
                        self.owner(&dependency.name),
                        Some(self.color(dependency)),
                    );
                }
                Self::edge(&mut out, &krate.name, &dependency.name);
            }
        }

        dot_document(&out)
    }

    fn write_dependencies(&self, out: &mut String, krate: &Crate, transitive: bool, visited: &mut HashSet<String>) {
        for dependency in &krate.dependencies {
            Self::node(
                out,
                &dependency.name,
                self.owner(&dependency.name),
                Some(self.color(dependency)),
            );
            Self::edge(out, &krate.name, &dependency.name);
        }

        if !transitive {
            return;
        }
        for dependency in &krate.dependencies {
            if !visited.insert(dependency.name.clone()) {
                continue;
            }
            if let Some(child) = self.graph.get(&dependency.name) {
                self.write_dependencies(out, child, true, visited);
            }
        }
    }

    /// Graph centered on one crate: its dependents and either its direct
    /// or its transitive dependencies.
    pub fn crate_graph(&self, krate: &Crate, transitive: bool) -> String {
        let mut out = String::new();
        Self::node(&mut out, &krate.name, krate.owner.as_deref(), Some("green"));

        for parent in self.graph.dependents_of(&krate.name) {
            Self::node(&mut out, &parent.name, parent.owner.as_deref(), Some("blue"));
            Self::edge(&mut out, &parent.name, &krate.name);
        }

        self.write_dependencies(&mut out, krate, transitive, &mut HashSet::new());
        dot_document(&out)
    }

    /// Write `all.dot`, `<crate>.dot` and `<crate>_full.dot`.
    pub fn write_all(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        let mut emit = |name: String, content: String| -> Result<()> {
            let path = folder.join(name);
            fs_utils::write_string(&path, &content)?;
            written.push(path);
            Ok(())
        };

        emit("all.dot".to_string(), self.all())?;
        for krate in self.graph.crates() {
            emit(format!("{}.dot", krate.name), self.crate_graph(krate, false))?;
        }
        for krate in self.graph.crates() {
            emit(format!("{}_full.dot", krate.name), self.crate_graph(krate, true))?;
        }
        Ok(written)
    }
}

/// Convert every `.dot` file in `folder` with graphviz.
pub fn convert_dot_files(
    runner: &dyn CommandRunner,
    folder: &Path,
    format: &str,
    keep_dot: bool,
) -> Result<Vec<PathBuf>> {
    let mut converted = Vec::new();
    for dot_file in fs_utils::glob_sorted(folder, "*.dot")? {
        let output = dot_file.with_extension(format);
        let spec = CommandSpec::new("dot")
            .arg(format!("-T{format}"))
            .arg(dot_file.display().to_string())
            .arg("-o")
            .arg(output.display().to_string());
        runner.run(&spec)?;

        if !keep_dot {
            std::fs::remove_file(&dot_file).map_err(|e| ChainopsError::io_at(&dot_file, e))?;
        }
        converted.push(output);
    }
    Ok(converted)
}

fn decode_entities(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let entity = ENTITY.get_or_init(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-z]+);").expect("static regex"));

    entity
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Wrap the contents of every crate node in a hyperlink. The first node
/// links back in history, other nodes link to their own graph.
pub fn link_svg(svg: &str, graph: &DependencyGraph, full: bool) -> String {
    static NODE: OnceLock<Regex> = OnceLock::new();
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let node = NODE.get_or_init(|| {
        Regex::new(r#"(?s)(<g\b[^>]*\bclass="node"[^>]*>)(.*?)(</g>)"#).expect("static regex")
    });
    let title = TITLE.get_or_init(|| Regex::new(r"(?s)<title>(.*?)</title>").expect("static regex"));

    let mut index = 0usize;
    node.replace_all(svg, |caps: &Captures<'_>| {
        let position = index;
        index += 1;

        let inner = &caps[2];
        let Some(name) = title.captures(inner).map(|t| decode_entities(t[1].trim())) else {
            return caps[0].to_string();
        };
        if !graph.contains(&name) {
            return caps[0].to_string();
        }

        let href = if position == 0 {
            "javascript:history.back()".to_string()
        } else if full {
            format!("{name}_full.svg")
        } else {
            format!("{name}.svg")
        };
        format!("{}<a href=\"{href}\">{inner}</a>{}", &caps[1], &caps[3])
    })
    .into_owned()
}

pub fn link_svg_files(folder: &Path, graph: &DependencyGraph) -> Result<()> {
    for svg in fs_utils::glob_sorted(folder, "*.svg")? {
        let full = svg.file_name().is_some_and(|n| n.to_string_lossy().contains("_full"));
        let content = fs_utils::read_to_string(&svg)?;
        fs_utils::write_string(&svg, &link_svg(&content, graph, full))?;
    }
    Ok(())
}

fn list_item(out: &mut String, file: &str) {
    let stem = file.strip_suffix(".svg").unwrap_or(file);
    let _ = writeln!(out, "<li><a href=\"{file}\">{stem}</a></li>");
}

/// Overview page listing the generated SVGs.
pub fn render_index(svg_names: &[String], title: &str, generated_at: &str) -> String {
    let mut names: Vec<&str> = svg_names.iter().map(String::as_str).collect();
    names.sort_unstable();
    let direct = names.iter().filter(|n| !n.ends_with("_full.svg") && **n != "all.svg");
    let full = names.iter().filter(|n| n.ends_with("_full.svg"));

    let mut out = String::from("<html><body>\n");
    let _ = writeln!(out, "<h1>{title}</h1>");
    let _ = writeln!(out, "<p>Generated {generated_at}</p>");

    out.push_str("<h3>All Dependencies</h3>\n<ul>\n");
    list_item(&mut out, "all.svg");
    out.push_str("</ul>\n");

    out.push_str("<h3>Direct Dependencies Only</h3>\n<ul>\n");
    for name in direct {
        list_item(&mut out, name);
    }
    list_item(&mut out, "all.svg");
    out.push_str("</ul>\n");

    out.push_str("<h3>Full Dependencies</h3>\n<ul>\n");
    for name in full {
        list_item(&mut out, name);
    }
    list_item(&mut out, "all.svg");
    out.push_str("</ul>\n");

    out.push_str("</body></html>\n");
    out
}

#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub target_folder: PathBuf,
    pub base_path: PathBuf,
    pub skip_dev_dependencies: bool,
    pub codeowners: Option<PathBuf>,
    pub format: String,
    pub keep_dot: bool,
    pub save_tree: Option<PathBuf>,
}

/// Full pipeline from `cargo tree` to the browsable output folder.
pub struct GraphGenerator<'r> {
    runner: &'r dyn CommandRunner,
    options: GraphOptions,
}

impl<'r> GraphGenerator<'r> {
    pub fn new(runner: &'r dyn CommandRunner, options: GraphOptions) -> Self {
        Self { runner, options }
    }

    fn load_owners(&self, base: &Path) -> Result<Option<CodeOwners>> {
        let path = self
            .options
            .codeowners
            .clone()
            .unwrap_or_else(|| base.join(".github").join("CODEOWNERS"));
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "CODEOWNERS not found, graphs carry no owners");
            return Ok(None);
        }
        CodeOwners::parse(&fs_utils::read_to_string(&path)?).map(Some)
    }

    pub fn run(&self) -> Result<DependencyGraph> {
        let base = std::fs::canonicalize(&self.options.base_path)
            .map_err(|e| ChainopsError::io_at(&self.options.base_path, e))?;
        let target = fs_utils::absolute(&self.options.target_folder)?;
        tracing::info!(target = %target.display(), base = %base.display(), "generating dependency graphs");

        let owners = self.load_owners(&base)?;
        let tree = run_cargo_tree(
            self.runner,
            &base,
            self.options.skip_dev_dependencies,
            self.options.save_tree.as_deref(),
        )?;
        let graph = parse_cargo_tree(
            &tree,
            &base.display().to_string(),
            owners.as_ref(),
            self.options.skip_dev_dependencies,
        );
        tracing::info!(crates = graph.len(), "parsed cargo tree");

        fs_utils::ensure_directory_exists(&target)?;
        DotWriter::new(&graph).write_all(&target)?;
        let outputs = convert_dot_files(self.runner, &target, &self.options.format, self.options.keep_dot)?;

        if self.options.format == "svg" {
            link_svg_files(&target, &graph)?;
            let names: Vec<String> = outputs
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            fs_utils::write_string(
                &target.join("index.html"),
                &render_index(&names, DEFAULT_INDEX_TITLE, &generated_at),
            )?;
        }

        Ok(graph)
    }
}
