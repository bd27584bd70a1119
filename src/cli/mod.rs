// CLI module for command-line interface

pub mod cargo_sort;
pub mod configs;
pub mod genesis;
pub mod graphs;
pub mod keystores;
pub mod rename;
pub mod search;
pub mod slipstream;

use clap::{ArgAction, Parser, Subcommand};

use crate::utils::error::Result;
use crate::utils::logging::LogFormat;

use self::cargo_sort::CargoSortCommand;
use self::configs::ConfigsCommand;
use self::genesis::GenesisCommand;
use self::graphs::GraphsCommand;
use self::keystores::KeystoresCommand;
use self::rename::RenameCommand;
use self::search::{SearchTestsCommand, SearchVersionsCommand};
use self::slipstream::SlipstreamCommand;

/// Main CLI structure
#[derive(Debug, Parser)]
#[command(name = "chainops")]
#[command(about = "Maintenance tooling for a validator/fullnode network and its upstream fork")]
#[command(long_about = r#"chainops bundles the maintenance utilities around a validator/fullnode
network and the fork of its upstream repository.

Tools:
  • Keystore, node config and genesis ceremony generation through docker
  • Dependency graph visualization from cargo tree
  • Cargo.toml dependency sorting
  • Fork rename and upstream slipstream automation
  • Code search for tests and versioned identifiers

Examples:
  chainops keystores --validators 4 --fullnodes 2   Generate node keystores
  chainops configs                                  Render node configs
  chainops genesis --dry-run                        Show the ceremony commands
  chainops cargo-sort --target .                   Sort Cargo.toml dependencies
  chainops -v graphs --base-path ../..              Dependency graphs with progress logs"#)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log verbosity. `cargo-sort --debug` implies debug output.
    pub fn verbosity(&self) -> u8 {
        match &self.command {
            Commands::CargoSort(cmd) if cmd.debug => self.verbose.max(2),
            _ => self.verbose,
        }
    }
}

/// All available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sort dependency entries of every Cargo.toml below a folder
    #[command(long_about = r#"Sort dependency entries of every Cargo.toml below a folder.

Dependencies are split into external and internal groups, each sorted by
alias, while comments stay attached to the entry they precede. Internal
crates are the packages found in the folder plus --internal-crate values.

Examples:
  chainops cargo-sort                           Sort the repository two levels up
  chainops cargo-sort --target .                Sort the current folder
  chainops cargo-sort --skip-dprint             Sort only
  chainops cargo-sort --check                   List files that would change"#)]
    CargoSort(CargoSortCommand),

    /// Generate validator and fullnode keystores through the key tool image
    Keystores(KeystoresCommand),

    /// Render node configs from generated keystores
    Configs(ConfigsCommand),

    /// Run the genesis ceremony in containers
    #[command(long_about = r#"Run the genesis ceremony in containers.

Every step runs the key tool binary in the tools image with the temp-genesis
folder mounted as its working directory.

Examples:
  chainops genesis                              Run all ceremony steps
  chainops genesis --dry-run                    Print the commands only"#)]
    Genesis(GenesisCommand),

    /// Render crate dependency graphs from cargo tree
    Graphs(GraphsCommand),

    /// Rebrand a source tree by rewriting contents and renaming paths
    #[command(long_about = r#"Rebrand a source tree by rewriting file contents and renaming paths.

Without --execute this is a dry run that prints every line it would change.
Lines that look risky to rewrite are collected and reported at the end.

Examples:
  chainops rename -p ../sui                     Dry run
  chainops rename -p ../sui --execute           Apply changes
  chainops rename --skip-filemod --use-git-mv   Only rename paths with git mv"#)]
    Rename(RenameCommand),

    /// Rebase the fork onto an upstream release
    Slipstream(Box<SlipstreamCommand>),

    /// Search test functions for a pattern
    SearchTests(SearchTestsCommand),

    /// Search for identifiers ending in a version suffix
    SearchVersions(SearchVersionsCommand),
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands) -> Result<()> {
        match command {
            Commands::CargoSort(cmd) => cmd.execute().await,
            Commands::Keystores(cmd) => cmd.execute().await,
            Commands::Configs(cmd) => cmd.execute().await,
            Commands::Genesis(cmd) => cmd.execute().await,
            Commands::Graphs(cmd) => cmd.execute().await,
            Commands::Rename(cmd) => cmd.execute().await,
            Commands::Slipstream(cmd) => cmd.execute().await,
            Commands::SearchTests(cmd) => cmd.execute().await,
            Commands::SearchVersions(cmd) => cmd.execute().await,
        }
    }
}
