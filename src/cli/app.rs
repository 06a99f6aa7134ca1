use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::init_logging;
use crate::config::{load_config, LoadedConfig};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    // Logging needs the file's settings; load quietly first.
    let LoadedConfig { config, path } = load_config(cli.config.as_ref()).await?;
    let level = cli.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    let format = cli.log_format.unwrap_or(config.logging.format);
    init_logging(level, format, cli.debug)?;

    info!("Starting uiauto-agent v{}", env!("CARGO_PKG_VERSION"));
    info!(config = %path.display(), "configuration resolved");
    let cli_context = CliContext::new(config, path);

    match dispatch(&cli, &cli_context).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
