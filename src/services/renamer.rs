// Fork rename: rewrite identifiers, add copyright notes, rename paths

use std::fmt;
use std::path::{Path, PathBuf};

use glob::MatchOptions;

use crate::models::rename_rules::RenameRules;
use crate::services::gitignore::GitIgnore;
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

const MAX_RENAME_ROUNDS: usize = 10;
const COPYRIGHT_MARKER: &str = "SPDX-License-Identifier";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspicionKind {
    PartOfUrl,
    IgnoreList,
    ReplacedButPossibleBreakingTests,
    CopyrightEdgeCase,
}

impl fmt::Display for SuspicionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PartOfUrl => "PART_OF_URL",
            Self::IgnoreList => "IGNORE_LIST",
            Self::ReplacedButPossibleBreakingTests => "REPLACED_BUT_POSSIBLE_BREAKING_TESTS",
            Self::CopyrightEdgeCase => "COPYRIGHT_EDGE_CASE",
        };
        f.write_str(label)
    }
}

/// A line that was left alone or needs a manual look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suspicious {
    pub path: PathBuf,
    pub line: usize,
    pub kind: SuspicionKind,
    pub content: String,
    pub word: String,
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    pub path: PathBuf,
    pub line: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenameReport {
    pub changes: Vec<LineChange>,
    pub copyright_added: Vec<PathBuf>,
    pub modified_files: Vec<PathBuf>,
    pub suspicious: Vec<Suspicious>,
    pub ignored: Vec<PathBuf>,
    pub skipped_binary: Vec<PathBuf>,
    pub renames: Vec<(PathBuf, PathBuf)>,
    pub rename_errors: Vec<(PathBuf, PathBuf)>,
    pub rounds: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub execute: bool,
    pub respect_gitignore: bool,
    pub skip_filemod: bool,
    pub use_git_mv: bool,
}

/// Result of rewriting one file's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRewrite {
    pub content: String,
    pub changes: Vec<(usize, String, String)>,
    pub suspicious: Vec<(usize, SuspicionKind, String, String, String)>,
    pub copyright_added: bool,
}

impl FileRewrite {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty() || self.copyright_added
    }
}

/// Apply the replacement rules to one line.
fn rewrite_line(
    rules: &RenameRules,
    line_no: usize,
    line: &str,
    suspicious: &mut Vec<(usize, SuspicionKind, String, String, String)>,
) -> String {
    let mut content = line.to_string();

    for replacement in &rules.replacements {
        if !content.contains(&replacement.from) {
            continue;
        }

        let mut skip = false;
        for word in content.split_whitespace() {
            let lower = word.to_lowercase();
            let mut flag = |kind, trigger: &str| {
                suspicious.push((line_no, kind, content.trim().to_string(), word.to_string(), trigger.to_string()));
            };

            if word.contains("://") && word.contains(&replacement.from) {
                flag(SuspicionKind::PartOfUrl, "://");
            }
            for ignore in &rules.ignore_words {
                if lower.contains(&ignore.to_lowercase()) {
                    flag(SuspicionKind::IgnoreList, ignore.as_str());
                    skip = true;
                }
            }
            for warn in &rules.warn_about {
                if word.contains(warn.as_str()) {
                    flag(SuspicionKind::ReplacedButPossibleBreakingTests, warn.as_str());
                }
            }
        }

        if !skip {
            content = content.replace(&replacement.from, &replacement.to);
        }
    }

    content
}

fn comment_prefix(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("f.write(\"//") {
        Some("     f.write(\"//")
    } else if trimmed.starts_with("//") {
        Some("//")
    } else if trimmed.starts_with('#') {
        Some("#")
    } else {
        None
    }
}

/// Insert the modification notice below the last license identifier.
fn add_copyright(
    rules: &RenameRules,
    file_name: &str,
    lines: &mut Vec<String>,
    suspicious: &mut Vec<(usize, SuspicionKind, String, String, String)>,
) -> bool {
    if [".patch", ".md", "lint.rs"].iter().any(|s| file_name.ends_with(s)) {
        return false;
    }
    if lines.iter().any(|l| l.contains(&rules.copyright_line)) {
        return false;
    }

    let mut target: Option<(usize, &'static str)> = None;
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(COPYRIGHT_MARKER) {
            continue;
        }
        match comment_prefix(line) {
            Some(prefix) => target = Some((i, prefix)),
            None => {
                suspicious.push((i, SuspicionKind::CopyrightEdgeCase, line.trim_end().to_string(), String::new(), String::new()));
                return false;
            }
        }
    }

    let Some((index, prefix)) = target else {
        return false;
    };
    if !lines[index].ends_with('\n') {
        lines[index].push('\n');
    }
    let notice = [
        "\n".to_string(),
        format!("{prefix} {}\n", rules.copyright_line),
        format!("{prefix} {COPYRIGHT_MARKER}: Apache-2.0\n"),
    ];
    lines.splice(index + 1..index + 1, notice);
    true
}

/// Rewrite a file's text. Line numbers in the result are zero-based.
pub fn rewrite_content(rules: &RenameRules, file_name: &str, text: &str) -> FileRewrite {
    let mut rewrite = FileRewrite::default();
    let mut lines: Vec<String> = text
        .split_inclusive('\n')
        .enumerate()
        .map(|(no, line)| {
            let updated = rewrite_line(rules, no, line, &mut rewrite.suspicious);
            if updated != line {
                rewrite
                    .changes
                    .push((no, line.trim().to_string(), updated.trim().to_string()));
            }
            updated
        })
        .collect();

    rewrite.copyright_added = add_copyright(rules, file_name, &mut lines, &mut rewrite.suspicious);
    rewrite.content = lines.concat();
    rewrite
}

fn relative_str(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

pub struct Renamer<'r> {
    root: PathBuf,
    rules: RenameRules,
    options: RenameOptions,
    runner: &'r dyn CommandRunner,
}

impl<'r> Renamer<'r> {
    pub fn new(root: &Path, rules: RenameRules, options: RenameOptions, runner: &'r dyn CommandRunner) -> Result<Self> {
        let root = std::fs::canonicalize(root).map_err(|e| ChainopsError::io_at(root, e))?;
        Ok(Self {
            root,
            rules,
            options,
            runner,
        })
    }

    fn load_gitignore(&self) -> Result<Option<GitIgnore>> {
        if !self.options.respect_gitignore {
            return Ok(None);
        }
        for name in [".gitignore.rename", ".gitignore"] {
            let path = self.root.join(name);
            if path.is_file() {
                tracing::info!(path = %path.display(), "using ignore file");
                return GitIgnore::load(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Every non-hidden path below the root, sorted.
    fn collect_paths(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!("{}/**/*", glob::Pattern::escape(&self.root.to_string_lossy()));
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: true,
        };
        let mut paths: Vec<PathBuf> = glob::glob_with(&pattern, options)
            .map_err(|e| ChainopsError::Config(format!("invalid glob '{pattern}': {e}")))?
            .filter_map(std::result::Result::ok)
            .filter(|p| p != &self.root)
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn is_ignored(&self, gitignore: Option<&GitIgnore>, path: &Path) -> bool {
        let relative = relative_str(&self.root, path);
        let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();

        gitignore.is_some_and(|g| g.is_ignored(&relative, path.is_dir()))
            || self.rules.ignored_paths.iter().any(|p| relative.starts_with(p.as_str()))
            || self.rules.is_ignored_extension(&file_name)
    }

    fn process_file(&self, path: &Path, report: &mut RenameReport) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|e| ChainopsError::io_at(path, e))?;
        let Ok(text) = String::from_utf8(bytes) else {
            tracing::warn!(path = %path.display(), "skipping file that is not valid UTF-8");
            report.skipped_binary.push(path.to_path_buf());
            return Ok(());
        };

        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let rewrite = rewrite_content(&self.rules, &file_name, &text);

        report.changes.extend(rewrite.changes.iter().map(|(line, before, after)| LineChange {
            path: path.to_path_buf(),
            line: *line,
            before: before.clone(),
            after: after.clone(),
        }));
        report.suspicious.extend(rewrite.suspicious.iter().map(|(line, kind, content, word, trigger)| Suspicious {
            path: path.to_path_buf(),
            line: *line,
            kind: *kind,
            content: content.clone(),
            word: word.clone(),
            trigger: trigger.clone(),
        }));
        if rewrite.copyright_added {
            report.copyright_added.push(path.to_path_buf());
        }

        if rewrite.changed() {
            report.modified_files.push(path.to_path_buf());
            if self.options.execute {
                fs_utils::write_string(path, &rewrite.content)?;
            }
        }
        Ok(())
    }

    fn move_path(&self, from: &Path, to: &Path) -> Result<()> {
        if self.options.use_git_mv {
            let spec = CommandSpec::new("git")
                .arg("mv")
                .arg(from.display().to_string())
                .arg(to.display().to_string())
                .current_dir(&self.root)
                .captured();
            self.runner.run(&spec).map(|_| ())
        } else {
            std::fs::rename(from, to).map_err(|e| ChainopsError::io_at(from, e))
        }
    }

    fn rename_round(&self, report: &mut RenameReport) -> Result<bool> {
        let mut renames: Vec<(PathBuf, PathBuf)> = Vec::new();

        for path in self.collect_paths()? {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !self.rules.replacements.iter().any(|r| name.contains(&r.from)) {
                continue;
            }
            let relative = relative_str(&self.root, &path);
            let renamed = self.rules.rename_path(&relative);
            if renamed != relative {
                renames.push((path, self.root.join(renamed)));
            }
        }

        renames.sort_by_key(|(from, _)| from.as_os_str().len());

        let mut failed = false;
        for (from, to) in renames {
            tracing::info!(from = %from.display(), to = %to.display(), "rename");
            if self.options.execute {
                if let Err(e) = self.move_path(&from, &to) {
                    tracing::debug!(error = %e, "rename failed, retrying next round");
                    report.rename_errors.push((from.clone(), to.clone()));
                    failed = true;
                    continue;
                }
            }
            report.renames.push((from, to));
        }

        Ok(!failed)
    }

    pub fn run(&self) -> Result<RenameReport> {
        let mut report = RenameReport::default();
        let gitignore = self.load_gitignore()?;

        let mut to_process = Vec::new();
        for path in self.collect_paths()? {
            if self.is_ignored(gitignore.as_ref(), &path) {
                report.ignored.push(path);
            } else {
                to_process.push(path);
            }
        }

        if !self.options.skip_filemod {
            tracing::info!(files = to_process.len(), "processing file contents");
            for path in to_process.iter().filter(|p| p.is_file()) {
                self.process_file(path, &mut report)?;
            }
        }

        while report.rounds < MAX_RENAME_ROUNDS {
            report.rounds += 1;
            report.rename_errors.clear();
            if self.rename_round(&mut report)? {
                break;
            }
        }

        Ok(report)
    }
}
