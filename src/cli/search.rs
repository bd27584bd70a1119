use clap::Args;

use crate::services::code_search::{
    render_tests_output, render_tests_report, render_versions_output, render_versions_report,
    TestSearch, VersionSearch,
};
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Search Rust test functions for a pattern
#[derive(Debug, Args)]
pub struct SearchTestsCommand {
    /// Target directory to search in
    #[arg(long, default_value = "../../")]
    pub target: String,

    /// Regex pattern to search for, case-insensitive
    #[arg(long)]
    pub regex: String,

    /// Output file to save the results
    #[arg(long, default_value = "output.txt")]
    pub output: String,

    /// Display file path and line number for each occurrence
    #[arg(long)]
    pub verbose: bool,

    /// Display the line where the occurrence was found
    #[arg(long)]
    pub debug: bool,
}

impl SearchTestsCommand {
    pub async fn execute(&self) -> Result<()> {
        let search = TestSearch::new(fs_utils::expand_user(&self.target), &self.regex)?;
        let results = search.run().await?;

        fs_utils::write_string(
            &fs_utils::expand_user(&self.output),
            &render_tests_output(&results),
        )?;
        print!("{}", render_tests_report(&results, self.verbose, self.debug));
        Ok(())
    }
}

/// Search for identifiers ending in a version suffix
#[derive(Debug, Args)]
pub struct SearchVersionsCommand {
    /// Target directory to search in
    #[arg(long, default_value = "../../")]
    pub target: String,

    /// Output file to save the results
    #[arg(long, default_value = "output.txt")]
    pub output: String,

    /// Display file path and line number for each occurrence
    #[arg(long)]
    pub verbose: bool,

    /// Display the line where the occurrence was found
    #[arg(long)]
    pub debug: bool,
}

impl SearchVersionsCommand {
    pub async fn execute(&self) -> Result<()> {
        let results = VersionSearch::new(fs_utils::expand_user(&self.target)).run().await?;

        fs_utils::write_string(
            &fs_utils::expand_user(&self.output),
            &render_versions_output(&results),
        )?;
        print!("{}", render_versions_report(&results, self.verbose, self.debug));
        Ok(())
    }
}
