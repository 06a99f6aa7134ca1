use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{stdin, stdout, BufReader};
use tracing::info;

use super::context::CliContext;
use crate::session::{build_dispatcher, serve_lines};

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Screen fixture (JSON or YAML) backing the device
    #[arg(long, value_name = "FILE")]
    pub screen: Option<PathBuf>,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let screen = ctx.screen(args.screen.as_deref()).await?;
    let dispatcher = build_dispatcher(Arc::new(screen), ctx.config().agent.clone()).await?;
    info!(
        actions = dispatcher.registry().actions().len(),
        "serving commands on stdin"
    );
    let answered = serve_lines(&dispatcher, BufReader::new(stdin()), stdout()).await?;
    info!(answered, "input closed");
    Ok(())
}
