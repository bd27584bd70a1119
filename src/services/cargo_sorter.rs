use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::models::manifest::{
    Manifest, ManifestNode, ManifestSection, NodeGroup, EXTERNAL_MARKER, INTERNAL_MARKER,
};
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

const MANIFEST_FILE: &str = "Cargo.toml";

fn array_start_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-zA-Z0-9_-]+)\s*=\s*\[$").expect("static regex"))
}

fn entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^([a-zA-Z0-9_-]+)(?:\.workspace)?\s*=\s*(?:\{[^}]*\bpackage\s*=\s*"(.*?)"[^}]*\}|.*)$"#,
        )
        .expect("static regex")
    })
}

/// Read `[package].name` from manifest text.
pub fn package_name(content: &str) -> Option<String> {
    if let Ok(table) = content.parse::<toml::Table>() {
        return table
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(toml::Value::as_str)
            .map(str::to_string);
    }

    // Unparseable manifests still get a best-effort line scan.
    let header = Regex::new(r"^\[([a-zA-Z0-9_-]+)\]$").ok()?;
    let name = Regex::new(r#"^name\s*=\s*"(.*)"$"#).ok()?;
    let mut in_package = false;
    for line in content.lines().map(str::trim) {
        if !in_package {
            in_package = line == "[package]";
            continue;
        }
        if let Some(caps) = name.captures(line) {
            return Some(caps[1].to_string());
        }
        if header.is_match(line) {
            return None;
        }
    }
    None
}

/// Every `[package].name` found in manifests below `root`.
pub fn discover_internal_crates(root: &Path) -> Result<BTreeSet<String>> {
    tracing::info!("Getting \"internal\" crates from 'Cargo.toml' files...");

    let mut names = BTreeSet::new();
    for path in fs_utils::walk_files(root, |dir| !dir.ends_with(".git"))? {
        if path.file_name().is_some_and(|n| n == MANIFEST_FILE) {
            if let Some(name) = package_name(&fs_utils::read_to_string(&path)?) {
                names.insert(name);
            }
        }
    }
    Ok(names)
}

/// Streaming parser that turns manifest lines into sections.
struct ManifestParser<'a> {
    file: &'a str,
    internal: &'a BTreeSet<String>,
    manifest: Manifest,
    current: Option<ManifestSection>,
    open_array: Option<(NodeGroup, String)>,
    pending: Vec<String>,
}

impl<'a> ManifestParser<'a> {
    fn new(file: &'a str, internal: &'a BTreeSet<String>) -> Self {
        Self {
            file,
            internal,
            manifest: Manifest::default(),
            current: None,
            open_array: None,
            pending: Vec::new(),
        }
    }

    fn group_for(&self, name: &str) -> NodeGroup {
        if self.internal.contains(name) {
            NodeGroup::Internal
        } else {
            NodeGroup::External
        }
    }

    fn error(&self, line: usize, message: String) -> ChainopsError {
        ChainopsError::Parse {
            file: self.file.to_string(),
            line,
            message,
        }
    }

    fn section_mut(&mut self, line: usize, what: &str) -> Result<&mut ManifestSection> {
        let file = self.file;
        self.current.as_mut().ok_or_else(|| ChainopsError::Parse {
            file: file.to_string(),
            line,
            message: format!("Node {what} without section"),
        })
    }

    /// Close the current section. Pending lines separated from the next
    /// header by a blank line stay with this section; the block directly
    /// above the next header moves on to it.
    fn finish_section(&mut self, at_eof: bool) {
        self.open_array = None;

        let Some(mut section) = self.current.take() else {
            return;
        };

        let pending = std::mem::take(&mut self.pending);
        let split = if at_eof {
            pending.len()
        } else {
            pending
                .iter()
                .rposition(|l| l.trim().is_empty())
                .map_or(0, |blank| blank + 1)
        };

        for line in pending[..split].iter().filter(|l| !l.trim().is_empty()) {
            section.add_unknown_line(line.clone());
        }
        self.pending = pending[split..].to_vec();

        self.manifest.sections.push(section);
    }

    fn feed(&mut self, number: usize, raw: &str) -> Result<()> {
        let line = raw.trim();

        if line == EXTERNAL_MARKER || line == INTERNAL_MARKER {
            return Ok(());
        }

        if line.starts_with('[') && line.ends_with(']') {
            tracing::debug!(line = number, header = line, "section header");
            self.finish_section(false);

            let mut section = ManifestSection::new(line);
            for pending in std::mem::take(&mut self.pending) {
                if !pending.trim().is_empty() {
                    section.add_unknown_line(pending);
                }
            }
            self.current = Some(section);
            return Ok(());
        }

        if let Some(caps) = array_start_regex().captures(line) {
            let alias = caps[1].to_string();
            tracing::debug!(line = number, array = %alias, "array start");

            let group = self.group_for(&alias);
            let comments = std::mem::take(&mut self.pending);
            self.section_mut(number, &alias)?
                .insert(group, ManifestNode::array(alias.clone(), line, comments));
            self.open_array = Some((group, alias));
            return Ok(());
        }

        if !line.contains('[') && line.ends_with(']') {
            tracing::debug!(line = number, "array end");

            let Some((group, alias)) = self.open_array.take() else {
                return Err(self.error(number, format!("Array end {line} without start")));
            };
            let file = self.file;
            let items: Vec<String> = std::mem::take(&mut self.pending)
                .into_iter()
                .filter(|l| !l.trim().is_empty())
                .collect();
            let node = self
                .section_mut(number, &alias)?
                .node_mut(group, &alias)
                .ok_or_else(|| ChainopsError::Parse {
                    file: file.to_string(),
                    line: number,
                    message: format!("Array {alias} vanished"),
                })?;
            for item in items {
                node.push_line(item);
            }
            node.push_line(raw.trim_end());
            return Ok(());
        }

        if let Some(caps) = entry_regex().captures(line) {
            let alias = caps[1].to_string();
            let name = caps.get(2).map_or_else(|| alias.clone(), |m| m.as_str().to_string());
            tracing::debug!(line = number, entry = %alias, crate_name = %name, "entry");

            let group = self.group_for(&name);
            let comments = std::mem::take(&mut self.pending);
            self.section_mut(number, &name)?
                .insert(group, ManifestNode::single(name, alias, line, comments));
            return Ok(());
        }

        tracing::trace!(line = number, "unknown line");
        self.pending.push(raw.trim_end().to_string());
        Ok(())
    }

    fn finish(mut self) -> Manifest {
        if self.current.is_some() {
            self.finish_section(true);
        } else {
            self.manifest.preamble = self
                .pending
                .drain(..)
                .filter(|l| !l.trim().is_empty())
                .collect();
        }
        self.manifest
    }
}

/// Parse manifest text into the section/node model.
pub fn parse_manifest(content: &str, file: &str, internal: &BTreeSet<String>) -> Result<Manifest> {
    let mut parser = ManifestParser::new(file, internal);
    for (index, line) in content.lines().enumerate() {
        parser.feed(index + 1, line)?;
    }
    Ok(parser.finish())
}

/// Sort the dependency entries of manifest text.
pub fn sort_manifest(content: &str, file: &str, internal: &BTreeSet<String>) -> Result<String> {
    Ok(parse_manifest(content, file, internal)?.render())
}

/// Options for a sorter run over a directory tree.
#[derive(Debug, Clone)]
pub struct CargoSortOptions {
    pub target: PathBuf,
    pub extra_internal: Vec<String>,
    pub ignored_folders: Vec<String>,
    /// Report instead of writing
    pub check: bool,
    pub run_dprint: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoSortReport {
    pub processed: Vec<PathBuf>,
    pub changed: Vec<PathBuf>,
    pub skipped_dirs: Vec<PathBuf>,
}

pub struct CargoSorter<'r> {
    options: CargoSortOptions,
    runner: &'r dyn CommandRunner,
}

impl<'r> CargoSorter<'r> {
    pub fn new(options: CargoSortOptions, runner: &'r dyn CommandRunner) -> Self {
        Self { options, runner }
    }

    pub fn run(&self) -> Result<CargoSortReport> {
        let mut internal = discover_internal_crates(&self.options.target)?;
        internal.extend(self.options.extra_internal.iter().cloned());

        let report = self.process_tree(&internal)?;

        if self.options.run_dprint && !self.options.check {
            tracing::info!("Running dprint fmt...");
            self.runner
                .run(&CommandSpec::new("dprint").arg("fmt").current_dir(&self.options.target))?;
        }

        Ok(report)
    }

    fn process_tree(&self, internal: &BTreeSet<String>) -> Result<CargoSortReport> {
        tracing::info!("Processing Cargo.toml files...");

        let ignored = self
            .options
            .ignored_folders
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut report = CargoSortReport::default();
        let root_text = self.options.target.to_string_lossy().to_string();
        if ignored.iter().any(|re| re.is_match(&root_text)) {
            tracing::info!("   Skipping directory (regex): {root_text}");
            report.skipped_dirs.push(self.options.target.clone());
            return Ok(report);
        }

        let skipped = std::cell::RefCell::new(Vec::new());
        let files = fs_utils::walk_files(&self.options.target, |dir| {
            let text = dir.to_string_lossy();
            if ignored.iter().any(|re| re.is_match(&text)) {
                tracing::info!("   Skipping directory (regex): {}", dir.display());
                skipped.borrow_mut().push(dir.to_path_buf());
                return false;
            }
            !dir.ends_with(".git")
        })?;
        report.skipped_dirs = skipped.into_inner();

        for path in files.into_iter().filter(|p| p.file_name().is_some_and(|n| n == MANIFEST_FILE)) {
            tracing::info!("Processing {}", path.display());
            let original = fs_utils::read_to_string(&path)?;
            let sorted = sort_manifest(&original, &path.to_string_lossy(), internal)?;

            if sorted != original {
                if !self.options.check {
                    fs_utils::write_string(&path, &sorted)?;
                }
                report.changed.push(path.clone());
            }
            report.processed.push(path);
        }

        Ok(report)
    }
}
