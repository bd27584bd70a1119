use clap::Args;
use std::fmt::Write as _;

use crate::models::rename_rules::RenameRules;
use crate::services::process::SystemRunner;
use crate::services::renamer::{RenameOptions, RenameReport, Renamer};
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Rebrand a source tree
#[derive(Debug, Args)]
pub struct RenameCommand {
    /// The path of the folder to process
    #[arg(short, long, default_value = ".")]
    pub path: String,

    /// Execute the replacements; without it this is a dry run
    #[arg(long)]
    pub execute: bool,

    /// Do not honor .gitignore and .gitignore.rename
    #[arg(long)]
    pub no_gitignore: bool,

    /// Skip file modification and only do the rename part
    #[arg(long)]
    pub skip_filemod: bool,

    /// Use git mv instead of a normal rename, for same repo modifications
    #[arg(long)]
    pub use_git_mv: bool,

    /// TOML file overriding the built-in replacement rules
    #[arg(long)]
    pub rules: Option<String>,
}

impl RenameCommand {
    pub async fn execute(&self) -> Result<()> {
        let rules = match &self.rules {
            Some(path) => RenameRules::load(&fs_utils::expand_user(path))?,
            None => RenameRules::default(),
        };
        let options = RenameOptions {
            execute: self.execute,
            respect_gitignore: !self.no_gitignore,
            skip_filemod: self.skip_filemod,
            use_git_mv: self.use_git_mv,
        };

        let runner = SystemRunner;
        let root = fs_utils::expand_user(&self.path);
        let report = Renamer::new(&root, rules, options, &runner)?.run()?;
        print!("{}", render_report(&report, self.execute));
        Ok(())
    }
}

/// Operator summary of a rename run.
pub fn render_report(report: &RenameReport, executed: bool) -> String {
    let mut out = String::new();

    for change in &report.changes {
        let _ = writeln!(out, "{}:{}", change.path.display(), change.line + 1);
        let _ = writeln!(out, "< {}", change.before);
        let _ = writeln!(out, "> {}", change.after);
    }
    for path in &report.copyright_added {
        let _ = writeln!(out, "copyright added: {}", path.display());
    }
    for (from, to) in &report.renames {
        let _ = writeln!(out, "rename {} -> {}", from.display(), to.display());
    }
    for (from, to) in &report.rename_errors {
        let _ = writeln!(out, "rename failed {} -> {}", from.display(), to.display());
    }

    if !report.suspicious.is_empty() {
        out.push_str("\nSuspicious lines:\n");
        for item in &report.suspicious {
            let _ = writeln!(
                out,
                "  [{}] {}:{} word '{}' (trigger '{}'): {}",
                item.kind,
                item.path.display(),
                item.line + 1,
                item.word,
                item.trigger,
                item.content.trim()
            );
        }
    }
    if !report.ignored.is_empty() {
        out.push_str("\nIgnored paths:\n");
        for path in &report.ignored {
            let _ = writeln!(out, "  {}", path.display());
        }
    }
    for path in &report.skipped_binary {
        let _ = writeln!(out, "skipped non-UTF-8 file: {}", path.display());
    }

    let mode = if executed { "applied" } else { "dry run" };
    let _ = writeln!(
        out,
        "\n{mode}: {} line change(s) in {} file(s), {} rename(s) over {} round(s)",
        report.changes.len(),
        report.modified_files.len(),
        report.renames.len(),
        report.rounds
    );
    out
}
