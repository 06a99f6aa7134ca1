use anyhow::Result;
use clap::{Args, Subcommand};
use tokio::fs;

use super::context::CliContext;
use crate::config::parse_config_file;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Validate the configuration file
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path();
    match args.action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            print!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Validate => {
            if fs::try_exists(path).await? {
                parse_config_file(path).await?.validate()?;
                println!("Configuration file {} is valid", path.display());
            } else {
                ctx.config().validate()?;
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
    }
    Ok(())
}
