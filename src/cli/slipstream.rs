use clap::Args;
use std::path::{Path, PathBuf};

use crate::models::slipstream_config::SlipstreamConfig;
use crate::services::process::SystemRunner;
use crate::services::slipstream::{
    Slipstream, SlipstreamOptions, SlipstreamSteps, DEFAULT_REPO_TAG, DEFAULT_REPO_URL,
};
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Rebase the fork onto an upstream release, step by step
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Args)]
pub struct SlipstreamCommand {
    /// The path to the configuration file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// The URL to the repository. Can also be a local folder
    #[arg(long, default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// The tag to checkout in the repository
    #[arg(long, default_value = DEFAULT_REPO_TAG)]
    pub repo_tag: String,

    /// The semantic version to filter overwrites/patches if not found in the repo-tag
    #[arg(long)]
    pub version: Option<String>,

    /// The path to the target folder
    #[arg(long, default_value = "result")]
    pub target_folder: String,

    /// The branch to create and checkout in the target folder
    #[arg(long)]
    pub target_branch: Option<String>,

    /// The path to the patches folder
    #[arg(long, default_value = "patches")]
    pub patches_folder: String,

    /// Create a commit between each step
    #[arg(long)]
    pub commit_between_steps: bool,

    /// Fail on linter errors (typos, cargo fmt, dprint, pnpm lint, cargo clippy)
    #[arg(long)]
    pub panic_on_linter_errors: bool,

    /// Clone the upstream repository
    #[arg(long)]
    pub clone_source: bool,

    /// Clone the complete history of the upstream repository
    #[arg(long)]
    pub clone_history: bool,

    /// Create a new branch in the target folder
    #[arg(long)]
    pub create_branch: bool,

    /// Delete files or folders based on the rules in the config
    #[arg(long)]
    pub delete: bool,

    /// Apply path renames based on the rules in the config
    #[arg(long)]
    pub apply_path_renames: bool,

    /// Apply code renames based on the rules in the config
    #[arg(long)]
    pub apply_code_renames: bool,

    /// Copy and overwrite files listed in the config
    #[arg(long)]
    pub copy_overwrites: bool,

    /// Apply git patches from the patches folder
    #[arg(long)]
    pub apply_patches: bool,

    /// Run typos to fix spelling
    #[arg(long)]
    pub run_fix_typos: bool,

    /// Run cargo fmt
    #[arg(long)]
    pub run_cargo_fmt: bool,

    /// Run dprint fmt
    #[arg(long)]
    pub run_dprint_fmt: bool,

    /// Run pnpm prettier:fix
    #[arg(long)]
    pub run_pnpm_prettier_fix: bool,

    /// Run pnpm lint:fix
    #[arg(long)]
    pub run_pnpm_lint_fix: bool,

    /// Run shell commands listed in the config
    #[arg(long)]
    pub run_shell_commands: bool,

    /// Run cargo clippy --fix
    #[arg(long)]
    pub run_cargo_clippy: bool,

    /// Recompile the framework system packages and bytecode snapshots
    #[arg(long)]
    pub recompile_framework_packages: bool,

    /// Open tool for comparison
    #[arg(long)]
    pub compare_results: bool,

    /// The path to the source folder for comparison
    #[arg(long, default_value = "../..")]
    pub compare_source_folder: String,

    /// The binary to use for comparison
    #[arg(long, default_value = "meld")]
    pub compare_tool_binary: String,

    /// The arguments to use for comparison
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub compare_tool_arguments: String,
}

impl SlipstreamCommand {
    pub const fn steps(&self) -> SlipstreamSteps {
        SlipstreamSteps {
            clone_source: self.clone_source,
            create_branch: self.create_branch,
            delete: self.delete,
            apply_path_renames: self.apply_path_renames,
            apply_code_renames: self.apply_code_renames,
            copy_overwrites: self.copy_overwrites,
            apply_patches: self.apply_patches,
            run_fix_typos: self.run_fix_typos,
            run_cargo_fmt: self.run_cargo_fmt,
            run_dprint_fmt: self.run_dprint_fmt,
            run_pnpm_prettier_fix: self.run_pnpm_prettier_fix,
            run_pnpm_lint_fix: self.run_pnpm_lint_fix,
            run_shell_commands: self.run_shell_commands,
            run_cargo_clippy: self.run_cargo_clippy,
            recompile_framework_packages: self.recompile_framework_packages,
            compare_results: self.compare_results,
        }
    }

    pub fn options(&self, config_path: &Path) -> SlipstreamOptions {
        let config_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        SlipstreamOptions {
            config_dir,
            repo_url: self.repo_url.clone(),
            repo_tag: self.repo_tag.clone(),
            version: self.version.clone(),
            target_folder: fs_utils::expand_user(&self.target_folder),
            target_branch: self.target_branch.clone(),
            patches_folder: fs_utils::expand_user(&self.patches_folder),
            clone_history: self.clone_history,
            commit_between_steps: self.commit_between_steps,
            panic_on_linter_errors: self.panic_on_linter_errors,
            compare_source_folder: fs_utils::expand_user(&self.compare_source_folder),
            compare_tool_binary: self.compare_tool_binary.clone(),
            compare_tool_arguments: self.compare_tool_arguments.clone(),
            steps: self.steps(),
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let config_path = fs_utils::expand_user(&self.config);
        let config = SlipstreamConfig::load(&config_path)?;
        let options = self.options(&config_path);

        let runner = SystemRunner;
        Slipstream::new(&runner, config, options)?.run()?;
        println!("slipstream finished in {}", self.target_folder);
        Ok(())
    }
}
