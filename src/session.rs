//! Wiring between the CLI and the command bridge.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use command_bridge::{AgentContext, AgentSettings, Dispatcher, HandlerRegistry};
use device_adapter::{ScreenFixture, UiDevice, VirtualScreen};
use tokio::fs;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Builds the dispatcher with every built-in handler, loading the configured
/// string resources first.
pub async fn build_dispatcher(
    device: Arc<dyn UiDevice>,
    settings: AgentSettings,
) -> Result<Dispatcher> {
    settings.validate()?;
    let strings_path = settings.strings_path.clone();
    let context = AgentContext::new(device, settings);
    if let Some(path) = strings_path {
        context
            .load_strings(&path)
            .await
            .with_context(|| format!("loading string resources from {}", path.display()))?;
    }
    Ok(Dispatcher::new(Arc::new(context), HandlerRegistry::builtin()))
}

/// Loads a screen fixture; `.yaml`/`.yml` files are YAML, anything else JSON.
pub async fn load_screen(path: &Path) -> Result<VirtualScreen> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let fixture: ScreenFixture = if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    };
    info!(path = %path.display(), package = %fixture.package, "loaded screen fixture");
    Ok(VirtualScreen::from_fixture(fixture))
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// One JSON command per input line, one result envelope per output line.
/// Blank lines are skipped. Returns the number of commands answered; a
/// lost automation session ends the loop with an error.
pub async fn serve_lines<R, W>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;
    while let Some(line) = lines.next_line().await.context("reading command")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let envelope = dispatcher.dispatch_json(line).await?;
        writer.write_all(envelope.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        answered += 1;
        debug!(answered, "command answered");
    }
    Ok(answered)
}
