// Slipstream configuration file

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;
use crate::utils::version::Version;

/// Regexes of folders, file names and file extensions to leave alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    pub folders: Vec<String>,
    pub files: Vec<String>,
    pub file_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneSection {
    pub ignore: IgnoreRules,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deletions {
    pub crates: Vec<String>,
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternIgnore {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePattern {
    pub regex: String,
    pub replacement: String,
    #[serde(default)]
    pub ignore: PatternIgnore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSection {
    pub ignore: IgnoreRules,
    pub patterns: Vec<RenamePattern>,
}

/// Optional version window of an overwrite or patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionBounds {
    pub min_sem_version: Option<String>,
    pub max_sem_version: Option<String>,
}

impl VersionBounds {
    /// Whether `version` lies inside the window. Bounds are inclusive.
    pub fn allows(&self, version: Version) -> Result<bool> {
        if let Some(min) = self.min_sem_version.as_deref().filter(|s| !s.is_empty()) {
            if version < Version::extract(min)? {
                return Ok(false);
            }
        }
        if let Some(max) = self.max_sem_version.as_deref().filter(|s| !s.is_empty()) {
            if version > Version::extract(max)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overwrite {
    pub source: String,
    pub destination: String,
    #[serde(flatten)]
    pub bounds: VersionBounds,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchEntry {
    #[serde(flatten)]
    pub bounds: VersionBounds,
    pub revert: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipstreamConfig {
    pub clone: CloneSection,
    pub deletions: Deletions,
    pub path_renames: RenameSection,
    pub code_renames: RenameSection,
    pub overwrites: Vec<Overwrite>,
    pub patches: BTreeMap<String, PatchEntry>,
    pub commands: Vec<String>,
}

impl SlipstreamConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ChainopsError::Config(format!("invalid slipstream config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading slipstream config");
        Self::from_json(&fs_utils::read_to_string(path)?)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Regex::new(p).map_err(ChainopsError::from)).collect()
}

/// Compiled form of [`IgnoreRules`].
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    folders: Vec<Regex>,
    files: Vec<Regex>,
    file_types: Vec<Regex>,
}

impl IgnoreMatcher {
    pub fn compile(rules: &IgnoreRules) -> Result<Self> {
        Ok(Self {
            folders: compile_all(&rules.folders)?,
            files: compile_all(&rules.files)?,
            file_types: compile_all(&rules.file_types)?,
        })
    }

    pub fn folder(&self, relative: &str) -> bool {
        self.folders.iter().any(|r| r.is_match(relative))
    }

    pub fn file(&self, text: &str) -> bool {
        self.files.iter().any(|r| r.is_match(text))
    }

    /// Matches against the extension including its dot, `""` if none.
    pub fn file_type(&self, file_name: &str) -> bool {
        let extension = Path::new(file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        self.file_types.iter().any(|r| r.is_match(&extension))
    }
}

/// Rewrite `\1` and `\g<name>` group references to the `${1}` form and
/// escape literal dollars.
pub fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// A compiled rename pattern with its per-pattern file exclusions.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub replacement: String,
    ignore_files: Vec<Regex>,
}

impl CompiledPattern {
    pub fn compile(pattern: &RenamePattern, multi_line: bool) -> Result<Self> {
        Ok(Self {
            regex: RegexBuilder::new(&pattern.regex).multi_line(multi_line).build()?,
            replacement: translate_replacement(&pattern.replacement),
            ignore_files: compile_all(&pattern.ignore.files)?,
        })
    }

    pub fn compile_all(patterns: &[RenamePattern], multi_line: bool) -> Result<Vec<Self>> {
        patterns.iter().map(|p| Self::compile(p, multi_line)).collect()
    }

    pub fn ignores(&self, text: &str) -> bool {
        self.ignore_files.iter().any(|r| r.is_match(text))
    }

    pub fn apply(&self, text: &str) -> String {
        self.regex.replace_all(text, self.replacement.as_str()).into_owned()
    }
}
