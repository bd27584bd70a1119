use clap::Args;

use crate::services::config_renderer::ConfigRenderer;
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Render validator, fullnode and faucet configs
#[derive(Debug, Args)]
pub struct ConfigsCommand {
    /// Folder holding `keystores/` and receiving the rendered configs
    #[arg(long, default_value = "./configs")]
    pub configs_dir: String,
}

impl ConfigsCommand {
    pub async fn execute(&self) -> Result<()> {
        let renderer = ConfigRenderer::new(fs_utils::expand_user(&self.configs_dir));
        for path in renderer.render_all()? {
            println!("wrote {}", path.display());
        }
        Ok(())
    }
}
