use clap::Args;
use std::path::PathBuf;

use crate::services::cargo_sorter::{CargoSortOptions, CargoSorter};
use crate::services::process::SystemRunner;
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

/// Sort Cargo.toml dependency entries
#[derive(Debug, Args)]
pub struct CargoSortCommand {
    /// Target directory to search in
    #[arg(long, default_value = "../../")]
    pub target: String,

    /// Skip running dprint fmt
    #[arg(long)]
    pub skip_dprint: bool,

    /// Show debug prints
    #[arg(long)]
    pub debug: bool,

    /// Crate treated as internal in addition to the ones found in the target
    #[arg(long = "internal-crate", default_values_t = vec!["iota-rust-sdk".to_string()])]
    pub internal_crates: Vec<String>,

    /// Regex of folders to skip
    #[arg(long = "ignore-folder", default_values_t = vec!["external-crates".to_string()])]
    pub ignore_folders: Vec<String>,

    /// Report files that would change without writing them
    #[arg(long)]
    pub check: bool,
}

impl CargoSortCommand {
    pub async fn execute(&self) -> Result<()> {
        tracing::debug!(?self, "cargo-sort arguments");
        let target: PathBuf = fs_utils::expand_user(&self.target);
        let options = CargoSortOptions {
            target,
            extra_internal: self.internal_crates.clone(),
            ignored_folders: self.ignore_folders.clone(),
            check: self.check,
            run_dprint: !self.skip_dprint,
        };

        let runner = SystemRunner;
        let report = CargoSorter::new(options, &runner).run()?;

        for path in &report.changed {
            if self.check {
                println!("would sort {}", path.display());
            } else {
                println!("sorted {}", path.display());
            }
        }
        println!(
            "{} Cargo.toml file(s) processed, {} changed",
            report.processed.len(),
            report.changed.len()
        );

        if self.check && !report.changed.is_empty() {
            return Err(ChainopsError::Unsorted(report.changed.len()));
        }
        Ok(())
    }
}
