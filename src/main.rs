// chainops - maintenance tooling for a validator/fullnode network
// Main CLI entry point

use chainops::cli::{Cli, CliDispatcher};
use chainops::utils::error::UserError;
use chainops::utils::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbosity());

    let result = CliDispatcher::execute(cli.command).await;

    if let Err(err) = result {
        let user_error = UserError::from_error(&err);
        user_error.print();
        process::exit(user_error.exit_code);
    }
}
