// Slipstream: replay the fork's changes on top of a fresh upstream checkout

use std::path::{Path, PathBuf};

use crate::models::slipstream_config::{
    CompiledPattern, IgnoreMatcher, RenameSection, SlipstreamConfig, VersionBounds,
};
use crate::services::process::{CommandRunner, CommandSpec};
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;
use crate::utils::version::Version;

pub const DEFAULT_REPO_URL: &str = "git@github.com:MystenLabs/sui.git";
pub const DEFAULT_REPO_TAG: &str = "mainnet-v1.22.0";
const TURBOREPO_IMAGE: &str = "turborepo-image";
const FRAMEWORK_SNAPSHOT_MANIFEST: &str = "crates/iota-framework-snapshot/manifest.json";
const FRAMEWORK_BYTECODE_SNAPSHOT: &str = "crates/iota-framework-snapshot/bytecode_snapshot";

/// Which steps to run. Steps always execute in declaration order.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default)]
pub struct SlipstreamSteps {
    pub clone_source: bool,
    pub create_branch: bool,
    pub delete: bool,
    pub apply_path_renames: bool,
    pub apply_code_renames: bool,
    pub copy_overwrites: bool,
    pub apply_patches: bool,
    pub run_fix_typos: bool,
    pub run_cargo_fmt: bool,
    pub run_dprint_fmt: bool,
    pub run_pnpm_prettier_fix: bool,
    pub run_pnpm_lint_fix: bool,
    pub run_shell_commands: bool,
    pub run_cargo_clippy: bool,
    pub recompile_framework_packages: bool,
    pub compare_results: bool,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct SlipstreamOptions {
    /// Folder holding the config file; overwrite sources and the
    /// turborepo Dockerfile are resolved against it
    pub config_dir: PathBuf,
    pub repo_url: String,
    pub repo_tag: String,
    pub version: Option<String>,
    pub target_folder: PathBuf,
    pub target_branch: Option<String>,
    pub patches_folder: PathBuf,
    pub clone_history: bool,
    pub commit_between_steps: bool,
    pub panic_on_linter_errors: bool,
    pub compare_source_folder: PathBuf,
    pub compare_tool_binary: String,
    pub compare_tool_arguments: String,
    pub steps: SlipstreamSteps,
}

/// Remove every `[[package]]` block of `Cargo.lock` whose `name` line
/// mentions one of `crates`.
pub fn remove_lock_packages(content: &str, crates: &[String]) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_package = false;
    let mut header_pending = false;
    let mut skipping = false;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();

        if trimmed == "[[package]]" {
            in_package = true;
            header_pending = true;
            continue;
        }
        if in_package && trimmed.starts_with("name =") && crates.iter().any(|c| line.contains(c.as_str())) {
            tracing::info!(package = trimmed, "removing package from Cargo.lock");
            skipping = true;
        }
        if in_package && trimmed.is_empty() {
            if !skipping {
                out.push_str(line);
            }
            in_package = false;
            header_pending = false;
            skipping = false;
            continue;
        }
        if skipping {
            continue;
        }
        if header_pending {
            out.push_str("[[package]]\n");
            header_pending = false;
        }
        out.push_str(line);
    }
    out
}

/// Drop manifest lines mentioning any of `crates`.
pub fn remove_manifest_lines(content: &str, crates: &[String]) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| {
            let trimmed = line.trim();
            let hit = crates.iter().any(|c| trimmed.contains(c.as_str()));
            if hit {
                tracing::info!(line = trimmed, "removing line from Cargo.toml");
            }
            !hit
        })
        .collect()
}

fn relative_str(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// `relative` in the `./`-prefixed form that ignore regexes may be anchored on.
fn dotted(relative: &str) -> String {
    format!("./{relative}")
}

fn file_name_of(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Recreate the symlink at `link` so it points at `target`.
fn relink(link: &Path, target: &Path) -> Result<()> {
    symlink::remove_symlink_auto(link).map_err(|e| ChainopsError::io_at(link, e))?;
    symlink::symlink_auto(target, link).map_err(|e| ChainopsError::io_at(link, e))
}

/// Copy a directory tree. Symlinks are copied as links. `ignore` receives
/// the path relative to `src` and whether it is a directory.
pub fn copy_tree<F>(src: &Path, dst: &Path, ignore: &F) -> Result<()>
where
    F: Fn(&str, bool) -> bool,
{
    fn copy_dir<F: Fn(&str, bool) -> bool>(root: &Path, dir: &Path, dst: &Path, ignore: &F) -> Result<()> {
        fs_utils::ensure_directory_exists(dst)?;
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| ChainopsError::io_at(dir, e))?
            .filter_map(std::result::Result::ok)
            .collect();
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let path = entry.path();
            let target = dst.join(entry.file_name());
            let file_type = entry.file_type().map_err(|e| ChainopsError::io_at(&path, e))?;
            let relative = relative_str(root, &path);

            if ignore(&relative, file_type.is_dir()) {
                tracing::debug!(path = %relative, "skipping");
                continue;
            }
            if file_type.is_symlink() {
                let link = std::fs::read_link(&path).map_err(|e| ChainopsError::io_at(&path, e))?;
                symlink::symlink_auto(&link, &target).map_err(|e| ChainopsError::io_at(&target, e))?;
            } else if file_type.is_dir() {
                copy_dir(root, &path, &target, ignore)?;
            } else {
                std::fs::copy(&path, &target).map_err(|e| ChainopsError::io_at(&path, e))?;
            }
        }
        Ok(())
    }

    copy_dir(src, src, dst, ignore)
}

pub struct Slipstream<'r> {
    runner: &'r dyn CommandRunner,
    config: SlipstreamConfig,
    options: SlipstreamOptions,
    target: PathBuf,
}

impl<'r> Slipstream<'r> {
    pub fn new(runner: &'r dyn CommandRunner, config: SlipstreamConfig, options: SlipstreamOptions) -> Result<Self> {
        let target = fs_utils::absolute(&options.target_folder)?;
        Ok(Self {
            runner,
            config,
            options,
            target,
        })
    }

    fn validate(&self) -> Result<Option<Version>> {
        let steps = &self.options.steps;
        if steps.clone_source || steps.copy_overwrites || steps.apply_patches {
            if self.options.repo_url.is_empty() {
                return Err(ChainopsError::Validation("The repository URL must be set.".into()));
            }
            if self.options.repo_tag.is_empty() {
                return Err(ChainopsError::Validation("The repository tag must be set.".into()));
            }
        }
        if steps.create_branch && self.options.target_branch.is_none() {
            return Err(ChainopsError::Validation(
                "The target branch must be set if a new branch should be created.".into(),
            ));
        }

        if !(steps.copy_overwrites || steps.apply_patches) {
            return Ok(None);
        }
        Version::extract(&self.options.repo_tag)
            .or_else(|_| Version::extract(self.options.version.as_deref().unwrap_or_default()))
            .map(Some)
            .map_err(|_| {
                ChainopsError::Validation(format!(
                    "Version not found in tag \"{}\", please provide a valid --version",
                    self.options.repo_tag
                ))
            })
    }

    fn in_target(&self, spec: CommandSpec) -> CommandSpec {
        spec.current_dir(&self.target)
    }

    fn run_in_target(&self, spec: CommandSpec) -> Result<()> {
        self.runner.run(&self.in_target(spec)).map(|_| ())
    }

    fn linter(&self, spec: CommandSpec) -> Result<()> {
        self.run_in_target(spec.checked(self.options.panic_on_linter_errors))
    }

    fn commit(&self, message: &str) -> Result<()> {
        if !self.options.commit_between_steps {
            return Ok(());
        }
        tracing::info!(commit = message, "committing changes");
        self.run_in_target(CommandSpec::new("git").args(["add", "."]))?;

        let diff = self
            .runner
            .run(&self.in_target(CommandSpec::new("git").args(["diff", "--cached", "--quiet"]).checked(false)))?;
        if diff.success() {
            tracing::info!("no changes to commit");
            return Ok(());
        }
        self.run_in_target(CommandSpec::new("git").args(["commit", "-q", "-m", message]))
    }

    /// Run every enabled step.
    pub fn run(&self) -> Result<()> {
        let version = self.validate()?;
        let steps = self.options.steps.clone();

        if steps.clone_source {
            self.clone_source()?;
        } else if !self.target.is_dir() {
            return Err(ChainopsError::Config(format!(
                "target folder {} does not exist",
                self.target.display()
            )));
        }

        if steps.create_branch {
            if let Some(branch) = &self.options.target_branch {
                self.run_in_target(CommandSpec::new("git").args(["checkout", "-b", branch.as_str()]))?;
            }
        }
        if steps.delete {
            self.delete()?;
            self.commit("fix: deleted unused folders and files")?;
        }
        if steps.apply_path_renames {
            self.apply_path_renames(&self.config.path_renames)?;
            self.commit("fix: renamed paths")?;
        }
        if steps.apply_code_renames {
            self.apply_code_renames(&self.config.code_renames)?;
            self.commit("fix: renamed code")?;
        }
        if let (true, Some(version)) = (steps.copy_overwrites, version) {
            self.copy_overwrites(version)?;
            self.commit("fix: copied overwrites")?;
        }
        if let (true, Some(version)) = (steps.apply_patches, version) {
            self.apply_patches(version, false)?;
            self.commit("fix: applied patches")?;
        }
        if steps.run_fix_typos {
            self.linter(CommandSpec::new("typos").arg("--write-changes"))?;
            self.commit("fix: ran typos")?;
        }
        if steps.run_cargo_fmt {
            self.linter(CommandSpec::new("cargo").args(["+nightly", "fmt"]))?;
            self.commit("fix: ran cargo fmt")?;
        }
        if steps.run_dprint_fmt {
            self.linter(CommandSpec::new("dprint").arg("fmt"))?;
            self.commit("fix: ran dprint fmt")?;
        }
        if steps.run_pnpm_prettier_fix {
            self.prepare_turborepo()?;
            self.linter(self.turborepo("pnpm turbo prettier:fix"))?;
            self.commit("fix: ran pnpm prettier:fix")?;
        }
        if steps.run_pnpm_lint_fix {
            self.prepare_turborepo()?;
            self.linter(self.turborepo("pnpm turbo build"))?;
            self.linter(self.turborepo("pnpm turbo lint:fix"))?;
            self.commit("fix: ran pnpm lint:fix")?;
        }
        if steps.run_shell_commands {
            for command in &self.config.commands {
                tracing::info!(command = %command, "running shell command");
                self.run_in_target(CommandSpec::shell(command.as_str()))?;
            }
            self.commit("fix: ran additional shell commands")?;
        }
        if steps.run_cargo_clippy {
            self.linter(CommandSpec::new("cargo").args(["clippy", "--fix"]))?;
            self.commit("fix: ran cargo clippy")?;
        }
        if let (true, Some(version)) = (steps.apply_patches, version) {
            self.apply_patches(version, true)?;
            self.commit("fix: reverted patches")?;
        }
        if steps.recompile_framework_packages {
            self.recompile_framework_packages()?;
            self.commit("fix: recompiled framework system packages and bytecode snapshots")?;
        }
        if steps.compare_results {
            self.compare_results()?;
        }
        Ok(())
    }

    fn clone_source(&self) -> Result<()> {
        let url = &self.options.repo_url;
        let tag = &self.options.repo_tag;
        tracing::info!(url = %url, tag = %tag, target = %self.target.display(), "cloning source");
        fs_utils::remove_dir_if_exists(&self.target)?;

        let local = fs_utils::expand_user(url);
        if !local.exists() {
            let mut spec = CommandSpec::new("git").arg("clone");
            if !self.options.clone_history {
                spec = spec.args(["--depth", "1"]);
            }
            spec = spec
                .args(["--single-branch", "--branch", tag.as_str(), url.as_str()])
                .arg(self.target.display().to_string());
            return self.runner.run(&spec).map(|_| ());
        }

        let git = |args: &[&str]| CommandSpec::new("git").args(args.iter().copied()).current_dir(&local);
        self.runner.run(&git(&["fetch", "--all"]))?;
        self.runner.run(&git(&["checkout", tag.as_str()]))?;
        let head = self.runner.run(&git(&["rev-parse", "--abbrev-ref", "HEAD"]).captured())?;
        if head.stdout.trim() != "HEAD" {
            tracing::info!("pulling latest changes");
            self.runner.run(&git(&["pull"]))?;
        }

        let source = fs_utils::absolute(&local)?;
        if source == self.target {
            return Ok(());
        }
        let matcher = IgnoreMatcher::compile(&self.config.clone.ignore)?;
        copy_tree(&source, &self.target, &|relative: &str, is_dir: bool| {
            let name = relative.rsplit('/').next().unwrap_or(relative);
            if is_dir {
                matcher.folder(relative)
            } else {
                matcher.file_type(name) || matcher.file(name)
            }
        })
    }

    fn delete(&self) -> Result<()> {
        let deletions = &self.config.deletions;

        if !deletions.crates.is_empty() {
            for krate in &deletions.crates {
                let folder = self.target.join("crates").join(krate);
                if folder.is_dir() {
                    tracing::info!(folder = %folder.display(), "deleting crate");
                    fs_utils::remove_dir_if_exists(&folder)?;
                }
            }

            let manifest = self.target.join("Cargo.toml");
            let content = fs_utils::read_to_string(&manifest)?;
            fs_utils::write_string(&manifest, &remove_manifest_lines(&content, &deletions.crates))?;

            let lock = self.target.join("Cargo.lock");
            let content = fs_utils::read_to_string(&lock)?;
            fs_utils::write_string(&lock, &remove_lock_packages(&content, &deletions.crates))?;
        }

        self.delete_folders(&deletions.folders)?;
        self.delete_files(&deletions.files)
    }

    fn delete_folders(&self, folders: &[String]) -> Result<()> {
        for folder in folders {
            let path = self.target.join(folder);
            if !path.exists() {
                return Err(ChainopsError::Validation(format!("Folder not found: {folder}")));
            }
            tracing::debug!(folder = %folder, "deleting folder");
            std::fs::remove_dir_all(&path).map_err(|e| ChainopsError::io_at(&path, e))?;
        }
        Ok(())
    }

    fn delete_files(&self, files: &[String]) -> Result<()> {
        for file in files {
            let path = self.target.join(file);
            if !path.exists() {
                return Err(ChainopsError::Validation(format!("File not found: {file}")));
            }
            tracing::debug!(file = %file, "deleting file");
            std::fs::remove_file(&path).map_err(|e| ChainopsError::io_at(&path, e))?;
        }
        Ok(())
    }

    /// Files below the target that survive the folder and file-type rules.
    fn walk(&self, ignore: &IgnoreMatcher) -> Result<Vec<PathBuf>> {
        if ignore.folder(".") {
            return Ok(Vec::new());
        }
        let files = fs_utils::walk_files(&self.target, |dir| {
            let relative = relative_str(&self.target, dir);
            let skip = ignore.folder(&relative) || ignore.folder(&dotted(&relative));
            if skip {
                tracing::debug!(folder = %relative, "skipping directory");
            }
            !skip
        })?;
        Ok(files
            .into_iter()
            .filter(|p| !ignore.file_type(&file_name_of(p)))
            .collect())
    }

    fn rename_with(patterns: &[CompiledPattern], path: &str) -> String {
        patterns.iter().fold(path.to_string(), |current, pattern| {
            if pattern.ignores(&current) {
                current
            } else {
                pattern.apply(&current)
            }
        })
    }

    fn apply_path_renames(&self, section: &RenameSection) -> Result<()> {
        tracing::info!("renaming paths");
        let ignore = IgnoreMatcher::compile(&section.ignore)?;
        let patterns = CompiledPattern::compile_all(&section.patterns, false)?;
        let mut touched_dirs: Vec<PathBuf> = Vec::new();

        for path in self.walk(&ignore)? {
            if ignore.file(&file_name_of(&path)) {
                continue;
            }
            let relative = relative_str(&self.target, &path);
            let renamed = Self::rename_with(&patterns, &dotted(&relative));
            let renamed = renamed.strip_prefix("./").unwrap_or(&renamed).to_string();
            if renamed == relative {
                continue;
            }

            tracing::debug!(from = %relative, to = %renamed, "renaming");
            let destination = self.target.join(&renamed);
            if let Some(parent) = destination.parent() {
                fs_utils::ensure_directory_exists(parent)?;
            }

            let moved = self.runner.run(&self.in_target(
                CommandSpec::new("git")
                    .args(["mv", relative.as_str(), renamed.as_str()])
                    .checked(false)
                    .captured(),
            ))?;
            if !moved.success() {
                let tracked = self.runner.run(&self.in_target(
                    CommandSpec::new("git")
                        .args(["ls-files", "--error-unmatch", relative.as_str()])
                        .checked(false)
                        .captured(),
                ))?;
                if tracked.success() {
                    return Err(ChainopsError::Execution {
                        program: format!("git mv {relative} {renamed}"),
                        code: moved.code,
                        stderr: moved.stderr,
                    });
                }
                tracing::warn!(path = %relative, "skipping file not tracked by git");
                continue;
            }

            if let Some(parent) = path.parent() {
                touched_dirs.push(parent.to_path_buf());
            }
        }

        self.remove_empty_dirs(touched_dirs)?;
        self.fix_symlinks(&ignore, &patterns)
    }

    fn remove_empty_dirs(&self, mut dirs: Vec<PathBuf>) -> Result<()> {
        dirs.sort();
        dirs.dedup();
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

        for dir in dirs {
            let mut current = dir;
            while current != self.target && current.starts_with(&self.target) && fs_utils::is_empty_dir(&current) {
                tracing::debug!(dir = %current.display(), "removing empty directory");
                std::fs::remove_dir(&current).map_err(|e| ChainopsError::io_at(&current, e))?;
                match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                }
            }
        }
        Ok(())
    }

    fn fix_symlinks(&self, ignore: &IgnoreMatcher, patterns: &[CompiledPattern]) -> Result<()> {
        for path in fs_utils::walk_files(&self.target, |_| true)? {
            if !path.is_symlink() {
                continue;
            }
            let link = std::fs::read_link(&path).map_err(|e| ChainopsError::io_at(&path, e))?;
            let target = link.to_string_lossy().replace('\\', "/");
            let (target_root, target_name) = target.rsplit_once('/').unwrap_or(("", target.as_str()));

            if ignore.folder(target_root) || ignore.file(target_name) || ignore.file_type(target_name) {
                continue;
            }

            let renamed = Self::rename_with(patterns, &target);
            if renamed == target {
                continue;
            }
            relink(&path, Path::new(&renamed))?;
            tracing::info!(link = %path.display(), from = %target, to = %renamed, "updated symlink");
        }
        Ok(())
    }

    fn apply_code_renames(&self, section: &RenameSection) -> Result<()> {
        tracing::info!("applying code renames");
        let ignore = IgnoreMatcher::compile(&section.ignore)?;
        let patterns = CompiledPattern::compile_all(&section.patterns, true)?;

        for path in self.walk(&ignore)? {
            let relative = relative_str(&self.target, &path);
            if ignore.file(&relative) || ignore.file(&dotted(&relative)) || path.is_symlink() {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| ChainopsError::io_at(&path, e))?;
            let content = String::from_utf8(bytes)
                .map_err(|_| ChainopsError::Validation(format!("file is not valid UTF-8: {relative}")))?;

            let name = file_name_of(&path);
            let renamed = patterns
                .iter()
                .filter(|p| !p.ignores(&name))
                .fold(content.clone(), |text, p| p.apply(&text));

            if renamed != content {
                tracing::debug!(file = %relative, "renaming code");
                fs_utils::write_string(&path, &renamed)?;
            }
        }
        Ok(())
    }

    fn copy_overwrites(&self, version: Version) -> Result<()> {
        tracing::info!("copying overwrites");
        for overwrite in &self.config.overwrites {
            if !self.allowed(&overwrite.bounds, version, &overwrite.source)? {
                continue;
            }
            let source = self.options.config_dir.join(fs_utils::expand_user(&overwrite.source));
            let destination = self.target.join(&overwrite.destination);

            if source.is_dir() {
                fs_utils::remove_dir_if_exists(&destination)?;
                tracing::info!(from = %source.display(), to = %destination.display(), "copying directory");
                copy_tree(&source, &destination, &|_: &str, _: bool| false)?;
            } else {
                tracing::info!(from = %source.display(), to = %destination.display(), "copying file");
                if let Some(parent) = destination.parent() {
                    fs_utils::ensure_directory_exists(parent)?;
                }
                std::fs::copy(&source, &destination).map_err(|e| ChainopsError::io_at(&source, e))?;
            }
        }
        Ok(())
    }

    fn allowed(&self, bounds: &VersionBounds, version: Version, name: &str) -> Result<bool> {
        let allowed = bounds.allows(version)?;
        if !allowed {
            tracing::info!(entry = name, %version, "skipping entry outside its version range");
        }
        Ok(allowed)
    }

    fn apply_patches(&self, version: Version, revert: bool) -> Result<()> {
        let folder = fs_utils::absolute(&self.options.patches_folder)?;
        tracing::info!(folder = %folder.display(), revert, "processing patches");

        for patch in fs_utils::glob_sorted(&folder, "*.patch")? {
            let name = patch.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let entry = self.config.patches.get(&name);

            if revert && !entry.is_some_and(|e| e.revert) {
                continue;
            }
            if let Some(entry) = entry {
                if !self.allowed(&entry.bounds, version, &name)? {
                    continue;
                }
            }

            let mut spec = CommandSpec::new("git").arg("apply");
            if revert {
                spec = spec.arg("-R");
            }
            spec = spec.args(["-C2", "--verbose"]).arg(patch.display().to_string());
            tracing::info!(patch = %name, "{}", if revert { "reverting patch" } else { "applying patch" });
            self.run_in_target(spec)?;
        }
        Ok(())
    }

    fn rust_toolchain_version(&self) -> Result<String> {
        let path = self.target.join("rust-toolchain.toml");
        let content = fs_utils::read_to_string(&path)?;
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| ChainopsError::Config(format!("{}: {e}", path.display())))?;

        table
            .get("toolchain")
            .and_then(|t| t.get("channel"))
            .and_then(toml::Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| ChainopsError::Config("Rust version not found in rust-toolchain.toml".into()))
    }

    fn turborepo(&self, script: &str) -> CommandSpec {
        CommandSpec::new("docker").args([
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            "turborepo".to_string(),
            "-v".to_string(),
            format!("{}:/home/node/app", self.target.display()),
            "--user".to_string(),
            "1000:1000".to_string(),
            TURBOREPO_IMAGE.to_string(),
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ])
    }

    fn prepare_turborepo(&self) -> Result<()> {
        let rust_version = self.rust_toolchain_version()?;
        tracing::info!(rust_version = %rust_version, "building turborepo image");

        self.runner.run(
            &CommandSpec::new("docker")
                .args([
                    "build".to_string(),
                    "--build-arg".to_string(),
                    format!("RUST_VERSION={rust_version}"),
                    "-t".to_string(),
                    TURBOREPO_IMAGE.to_string(),
                    "-f".to_string(),
                    "./docker_turborepo/Dockerfile".to_string(),
                    ".".to_string(),
                ])
                .current_dir(&self.options.config_dir),
        )?;
        self.runner.run(&self.turborepo("pnpm i"))?;
        self.runner.run(&self.turborepo("pnpm add -w --save-dev eslint-config-next"))?;
        Ok(())
    }

    fn recompile_framework_packages(&self) -> Result<()> {
        tracing::info!("recompiling framework packages and bytecode snapshots");
        self.delete_files(&[FRAMEWORK_SNAPSHOT_MANIFEST.to_string()])?;
        self.delete_folders(&[FRAMEWORK_BYTECODE_SNAPSHOT.to_string()])?;

        self.run_in_target(CommandSpec::new("cargo").arg("build"))?;
        self.run_in_target(
            CommandSpec::new("cargo")
                .args(["test", "-p", "iota-framework", "--test", "build-system-packages"])
                .env("UPDATE", "1"),
        )?;
        self.run_in_target(CommandSpec::new("cargo").args(["run", "--bin", "iota-framework-snapshot"]))
    }

    fn compare_results(&self) -> Result<()> {
        let extra = shlex::split(&self.options.compare_tool_arguments).ok_or_else(|| {
            ChainopsError::Validation(format!(
                "cannot split compare tool arguments: {}",
                self.options.compare_tool_arguments
            ))
        })?;
        let source = fs_utils::absolute(&self.options.compare_source_folder)?;
        let spec = CommandSpec::new(self.options.compare_tool_binary.as_str())
            .args(extra)
            .arg(source.display().to_string())
            .arg(self.target.display().to_string())
            .checked(false);
        tracing::info!(command = %spec, "opening compare tool");
        self.runner.run(&spec).map(|_| ())
    }
}
