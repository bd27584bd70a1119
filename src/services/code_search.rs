// Parallel scanning of Rust sources for test functions and versioned identifiers

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::{Regex, RegexBuilder};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::models::search_result::{Location, TestMatch, VersionOccurrence};
use crate::services::cargo_sorter;
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

pub const TEST_IGNORED_DIRS: &[&str] = &[".git", "scripts", "node_modules", ".pnpm_store"];

pub const VERSION_IGNORED_DIRS: &[&str] = &[
    ".git",
    "scripts",
    "node_modules",
    ".pnpm_store",
    "unit_tests",
    "move-compiler",
    "move-vm-types",
    "move-bytecode-verifier",
    "move-binary-format",
    "move-core-types",
    "move-ir-types",
    "move-model",
    "move-prover",
    "move-vm-integration-tests",
];

/// Identifiers that look versioned but are not.
pub const IGNORED_VERSION_MATCHES: &[&str] = &[
    "Uuid::new_v4",
    "recv0",
    "recv1",
    "IpAddr::V4",
    "IpAddr::V6",
    "icmpv6",
    "tlsv1",
    "multi_addr_ipv4",
    "multi_addr_ipv6",
    "socket_addr_ipv4",
    "socket_addr_ipv6",
    "SocketAddr::V4",
    "SocketAddr::V6",
    "SocketAddrV4",
    "SocketAddrV6",
    "ipv4",
    "ipv6",
    "IpProto::Ipv4",
    "IpProto::Ipv6",
    "eval_ipv6",
    "EtherType::Ipv4",
    "EtherType::Ipv6",
    "to_ipv4",
    "ev1",
    "ev2",
    "sigv4",
];

pub const UNKNOWN_CRATE: &str = "Unknown";

const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const BLUE: &str = "\x1b[94m";
const WHITE: &str = "\x1b[97m";
const RESET: &str = "\x1b[0m";

fn test_attribute_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"^#\[test(\([^)]*\))?\]").expect("static regex"),
            Regex::new(r"^#\[tokio::test(\([^)]*\))?\]").expect("static regex"),
            Regex::new(r"^#\[sim_test(\([^)]*\))?\]").expect("static regex"),
        ]
    })
}

fn fn_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"fn\s+([\w_]+)\s*(<[^>]*>)?\s*\(").expect("static regex"))
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\w|::)*[Vv]\d+\b").expect("static regex"))
}

/// Every `*.rs` file below `target`, skipping directories whose path
/// relative to `target` contains one of `ignored_dirs` as a substring.
pub fn collect_rust_files(target: &Path, ignored_dirs: &[&str]) -> Result<Vec<PathBuf>> {
    let skipped = |dir: &Path| {
        let relative = dir.strip_prefix(target).unwrap_or(dir).to_string_lossy();
        ignored_dirs.iter().any(|ignored| relative.contains(ignored))
    };

    let files = fs_utils::walk_files(target, |dir| !skipped(dir))?;
    Ok(files
        .into_iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("rs"))
        })
        .collect())
}

/// Run `scan` over `files` on the blocking pool, at most one task per core.
///
/// Results come back sorted by path so merges are deterministic.
pub async fn scan_in_parallel<T, F>(files: Vec<PathBuf>, scan: F) -> Result<Vec<(PathBuf, T)>>
where
    T: Send + 'static,
    F: Fn(&Path) -> Result<T> + Send + Sync + 'static,
{
    let width = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let semaphore = Arc::new(Semaphore::new(width));
    let scan = Arc::new(scan);
    let mut tasks = JoinSet::new();

    debug!(files = files.len(), width, "scanning files");
    for path in files {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ChainopsError::Io(std::io::Error::other(e)))?;
        let scan = Arc::clone(&scan);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = scan(&path);
            (path, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (path, result) = joined.map_err(|e| ChainopsError::Io(std::io::Error::other(e)))?;
        results.push((path, result?));
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| ChainopsError::io_at(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Test functions in one file whose name or body matches `pattern`.
pub fn scan_tests(path: &Path, content: &str, pattern: &Regex) -> BTreeMap<String, TestMatch> {
    let mut results = BTreeMap::new();
    let mut has_attribute = false;
    let mut current: Option<(String, usize)> = None;
    let mut body: Vec<&str> = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let stripped = line.trim();

        if current.is_none() {
            if test_attribute_regexes().iter().any(|re| re.is_match(stripped)) {
                has_attribute = true;
            }
            if has_attribute {
                if let Some(caps) = fn_name_regex().captures(stripped) {
                    current = Some((caps[1].to_string(), index + 1));
                    body.clear();
                }
            }
        }

        let Some((name, start)) = &current else {
            continue;
        };
        body.push(line);
        if !stripped.ends_with('}') {
            continue;
        }

        let matched_line = body
            .iter()
            .find(|l| pattern.is_match(l))
            .map(|l| l.trim().to_string())
            .or_else(|| pattern.is_match(name).then(|| name.clone()));
        if let Some(matched_line) = matched_line {
            results.insert(
                name.clone(),
                TestMatch {
                    name: name.clone(),
                    path: path.to_path_buf(),
                    line_num: *start,
                    line: matched_line,
                },
            );
        }

        current = None;
        has_attribute = false;
        body.clear();
    }

    results
}

/// Versioned identifiers in one file, without crate attribution.
pub fn scan_versions(path: &Path, content: &str) -> BTreeMap<String, VersionOccurrence> {
    let mut occurrences: BTreeMap<String, VersionOccurrence> = BTreeMap::new();

    for (index, line) in content.lines().enumerate() {
        for found in version_regex().find_iter(line) {
            let name = found.as_str();
            if IGNORED_VERSION_MATCHES.contains(&name) {
                continue;
            }
            occurrences.entry(name.to_string()).or_default().record(Location {
                path: path.to_path_buf(),
                line_num: index + 1,
                text: line.trim().to_string(),
            });
        }
    }

    occurrences
}

/// Resolves the crate owning a directory from the nearest `Cargo.toml` upward.
#[derive(Debug, Default)]
pub struct CrateLocator {
    cache: HashMap<PathBuf, String>,
}

impl CrateLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crate_of(&mut self, dir: &Path) -> String {
        if let Some(name) = self.cache.get(dir) {
            return name.clone();
        }

        let name = dir
            .ancestors()
            .map(|ancestor| ancestor.join("Cargo.toml"))
            .find(|manifest| manifest.is_file())
            .and_then(|manifest| fs::read_to_string(manifest).ok())
            .and_then(|content| cargo_sorter::package_name(&content))
            .unwrap_or_else(|| UNKNOWN_CRATE.to_string());

        self.cache.insert(dir.to_path_buf(), name.clone());
        name
    }
}

/// Finds test functions matching a case-insensitive pattern.
pub struct TestSearch {
    target: PathBuf,
    pattern: Regex,
}

impl TestSearch {
    pub fn new(target: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(ChainopsError::Validation(
                "Please provide a regex pattern to search for.".to_string(),
            ));
        }
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            target: target.into(),
            pattern,
        })
    }

    pub async fn run(&self) -> Result<BTreeMap<String, TestMatch>> {
        let files = collect_rust_files(&self.target, TEST_IGNORED_DIRS)?;
        info!(target = %self.target.display(), files = files.len(), "searching tests");

        let pattern = self.pattern.clone();
        let per_file = scan_in_parallel(files, move |path| {
            let content = read_lossy(path)?;
            Ok(scan_tests(path, &content, &pattern))
        })
        .await?;

        let mut results = BTreeMap::new();
        for (_, found) in per_file {
            for (name, test) in found {
                if results.contains_key(&name) {
                    return Err(ChainopsError::Validation(format!(
                        "Duplicate function name found: {name}"
                    )));
                }
                results.insert(name, test);
            }
        }
        Ok(results)
    }
}

/// Finds identifiers ending in a version suffix such as `V2` or `v1`.
pub struct VersionSearch {
    target: PathBuf,
}

impl VersionSearch {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub async fn run(&self) -> Result<BTreeMap<String, VersionOccurrence>> {
        let files = collect_rust_files(&self.target, VERSION_IGNORED_DIRS)?;
        info!(target = %self.target.display(), files = files.len(), "searching versioned identifiers");

        let per_file = scan_in_parallel(files, |path| {
            let content = read_lossy(path)?;
            Ok(scan_versions(path, &content))
        })
        .await?;

        let mut locator = CrateLocator::new();
        let mut results: BTreeMap<String, VersionOccurrence> = BTreeMap::new();
        for (path, found) in per_file {
            let owner = locator.crate_of(path.parent().unwrap_or(path.as_path()));
            for (name, mut occurrence) in found {
                occurrence.add_crate(&owner);
                results.entry(name).or_default().merge(occurrence);
            }
        }
        Ok(results)
    }
}

pub fn render_tests_output(results: &BTreeMap<String, TestMatch>) -> String {
    let mut out = String::new();
    for test in results.values() {
        let _ = writeln!(out, "{}", test.name);
        let _ = writeln!(out, "    {}:{}", test.path.display(), test.line_num);
    }
    out
}

pub fn render_tests_report(
    results: &BTreeMap<String, TestMatch>,
    verbose: bool,
    debug: bool,
) -> String {
    let mut out = String::new();
    for test in results.values() {
        let _ = writeln!(out, "{RED}{}{RESET}", test.name);
        if verbose {
            let _ = writeln!(out, "    {BLUE}{}:{}{RESET}", test.path.display(), test.line_num);
            if debug {
                let _ = writeln!(out, "        => {GREEN}{}{RESET}", test.line);
            }
        }
    }
    out
}

pub fn render_versions_output(results: &BTreeMap<String, VersionOccurrence>) -> String {
    let mut out = String::new();
    for (name, occurrence) in results {
        let _ = writeln!(out, "{name:90}: {} occurrence(s)", occurrence.count);
        for location in &occurrence.locations {
            let _ = writeln!(
                out,
                "  - {}, line {}",
                location.path.display(),
                location.line_num
            );
        }
    }
    out
}

pub fn render_versions_report(
    results: &BTreeMap<String, VersionOccurrence>,
    verbose: bool,
    debug: bool,
) -> String {
    let mut out = String::new();
    for (name, occurrence) in results {
        let _ = writeln!(out, "{RED}{name:90}{RESET} {}: occurrence(s)", occurrence.count);
        let _ = writeln!(out, "  - Crates: {BLUE}{}{RESET}", occurrence.crates.join(", "));
        if verbose {
            for location in &occurrence.locations {
                let _ = writeln!(
                    out,
                    "    - {WHITE}{}, line {}{RESET}",
                    location.path.display(),
                    location.line_num
                );
                if debug {
                    let _ = writeln!(out, "        => {GREEN}{}{RESET}", location.text);
                }
            }
        }
    }
    out
}
