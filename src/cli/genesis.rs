use clap::Args;

use crate::services::genesis_ceremony::{
    GenesisCeremony, GenesisOptions, DEFAULT_MIGRATION_SNAPSHOT, DEFAULT_TOKEN_ALLOCATION_NANOS,
};
use crate::services::keytool::{DEFAULT_TOOLS_BINARY, DEFAULT_TOOLS_IMAGE};
use crate::services::process::SystemRunner;
use crate::utils::error::Result;
use crate::utils::fs_utils;

/// Run the genesis ceremony
#[derive(Debug, Args)]
pub struct GenesisCommand {
    /// Folder holding `keystores/`; `temp-genesis/` is created inside it
    #[arg(long, default_value = "./configs")]
    pub configs_dir: String,

    /// Docker image providing the key tool
    #[arg(long, default_value = DEFAULT_TOOLS_IMAGE)]
    pub image: String,

    /// Key tool binary inside the image
    #[arg(long, default_value = DEFAULT_TOOLS_BINARY)]
    pub binary: String,

    /// Tokens allocated to the faucet address, in nanos
    #[arg(long, default_value = DEFAULT_TOKEN_ALLOCATION_NANOS)]
    pub token_allocation_nanos: String,

    /// Migration snapshot used by build-unsigned-checkpoint
    #[arg(long, default_value = DEFAULT_MIGRATION_SNAPSHOT)]
    pub migration_snapshot: String,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

impl GenesisCommand {
    pub async fn execute(&self) -> Result<()> {
        let options = GenesisOptions {
            configs_dir: fs_utils::expand_user(&self.configs_dir),
            image: self.image.clone(),
            binary: self.binary.clone(),
            token_allocation_nanos: self.token_allocation_nanos.clone(),
            migration_snapshot: self.migration_snapshot.clone(),
        };

        let runner = SystemRunner;
        let steps = GenesisCeremony::new(&runner, options).run(self.dry_run)?;

        if self.dry_run {
            for step in &steps {
                println!("{step}");
            }
        } else {
            println!("genesis ceremony finished ({} steps)", steps.len());
        }
        Ok(())
    }
}
