//! Command handlers, one module per top-level subcommand.

pub mod clusters;
pub mod config_cmd;
pub mod hosts;
pub mod ident;
pub mod sync;
pub mod util;

use clap::CommandFactory;

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sync(args) => sync::handle(args, global).await,
        Command::Clusters(args) => clusters::handle(args, global).await,
        Command::Hosts(args) => hosts::handle(args, global).await,
        Command::Ident(args) => ident::handle(&args, global),
        // Config commands don't need a store
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }
    }
}

fn completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "invsync", &mut std::io::stdout());
}
