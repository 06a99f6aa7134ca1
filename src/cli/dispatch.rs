use anyhow::Result;

use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::replay::cmd_replay;
use super::serve::cmd_serve;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Serve(args) => cmd_serve(args, ctx).await,
        Commands::Replay(args) => cmd_replay(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
