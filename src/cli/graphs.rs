use clap::Args;

use crate::services::graph_renderer::{GraphGenerator, GraphOptions};
use crate::services::process::SystemRunner;
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Render dependency graphs of the workspace crates
#[derive(Debug, Args)]
pub struct GraphsCommand {
    /// The path to the target folder
    #[arg(long, default_value = "output")]
    pub target_folder: String,

    /// Workspace root that `cargo tree` runs in
    #[arg(long, default_value = "../../")]
    pub base_path: String,

    /// Whether or not to include the `dev-dependencies`
    #[arg(long)]
    pub skip_dev_dependencies: bool,

    /// CODEOWNERS file used for owner labels (default: <base-path>/.github/CODEOWNERS)
    #[arg(long)]
    pub codeowners: Option<String>,

    /// Output format passed to `dot -T`
    #[arg(long, default_value = "svg")]
    pub format: String,

    /// Keep the intermediate .dot files
    #[arg(long)]
    pub keep_dot: bool,

    /// Also write the raw `cargo tree` output to this file
    #[arg(long)]
    pub save_tree: Option<String>,
}

impl GraphsCommand {
    pub async fn execute(&self) -> Result<()> {
        let options = GraphOptions {
            target_folder: fs_utils::expand_user(&self.target_folder),
            base_path: fs_utils::expand_user(&self.base_path),
            skip_dev_dependencies: self.skip_dev_dependencies,
            codeowners: self.codeowners.as_deref().map(fs_utils::expand_user),
            format: self.format.clone(),
            keep_dot: self.keep_dot,
            save_tree: self.save_tree.as_deref().map(fs_utils::expand_user),
        };

        let runner = SystemRunner;
        let graph = GraphGenerator::new(&runner, options).run()?;
        println!(
            "rendered {} crate graph(s) into {}",
            graph.len(),
            self.target_folder
        );
        Ok(())
    }
}
