use clap::Args;

use crate::services::keytool::{
    KeystoreGenerator, Keytool, DEFAULT_TOOLS_BINARY, DEFAULT_TOOLS_IMAGE,
};
use crate::services::process::SystemRunner;
use crate::utils::error::{ChainopsError, Result};
use crate::utils::fs_utils;

/// Generate node keystores
#[derive(Debug, Args)]
pub struct KeystoresCommand {
    /// Folder receiving `<node>.json` and `peer_list.yaml`
    #[arg(long, default_value = "./configs/keystores")]
    pub output: String,

    /// Number of validators
    #[arg(long, default_value_t = 4)]
    pub validators: usize,

    /// Number of fullnodes
    #[arg(long, default_value_t = 2)]
    pub fullnodes: usize,

    /// Docker image providing the key tool
    #[arg(long, default_value = DEFAULT_TOOLS_IMAGE)]
    pub image: String,

    /// Key tool binary inside the image
    #[arg(long, default_value = DEFAULT_TOOLS_BINARY)]
    pub binary: String,
}

impl KeystoresCommand {
    pub async fn execute(&self) -> Result<()> {
        if self.validators == 0 {
            return Err(ChainopsError::Validation(
                "At least one validator is required".to_string(),
            ));
        }

        let output = fs_utils::expand_user(&self.output);
        let runner = SystemRunner;
        let keytool = Keytool::new(&runner, self.image.as_str(), self.binary.as_str());
        let keys = KeystoreGenerator::new(&keytool).network(self.validators, self.fullnodes)?;

        for path in keys.store(&output)? {
            println!("wrote {}", path.display());
        }
        Ok(())
    }
}
