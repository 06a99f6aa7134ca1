use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use command_bridge::{encode, Command, CommandResult, Dispatcher};
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use super::context::CliContext;
use crate::session::{build_dispatcher, is_yaml};

/// Stands for the element key returned by the most recent `find`.
pub const LAST_ELEMENT: &str = "$last";

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Script of commands (JSON array or YAML list)
    pub script: PathBuf,

    /// Screen fixture (JSON or YAML) backing the device
    #[arg(long, value_name = "FILE")]
    pub screen: Option<PathBuf>,

    /// Stop at the first command that does not succeed
    #[arg(long)]
    pub stop_on_error: bool,

    /// Print the pointer and key events the screen received
    #[arg(long)]
    pub events: bool,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext) -> Result<()> {
    let screen = ctx.screen(args.screen.as_deref()).await?;
    let commands = load_script(&args.script).await?;
    let dispatcher = build_dispatcher(Arc::new(screen.clone()), ctx.config().agent.clone()).await?;

    let results = replay(&dispatcher, commands, args.stop_on_error).await?;
    for result in &results {
        println!("{}", encode(result));
    }
    if args.events {
        for event in screen.events() {
            println!("{:>8}ms {:?}", event.at.as_millis(), event.kind);
        }
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(commands = results.len(), failed, "replay finished");
    Ok(())
}

pub async fn load_script(path: &Path) -> Result<Vec<Command>> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let commands = if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(commands)
}

/// Dispatches `commands` in order, substituting [`LAST_ELEMENT`] in element
/// ids and `context`.
pub async fn replay(
    dispatcher: &Dispatcher,
    commands: Vec<Command>,
    stop_on_error: bool,
) -> Result<Vec<CommandResult>> {
    let mut results = Vec::with_capacity(commands.len());
    let mut last: Option<String> = None;
    for mut command in commands {
        substitute(&mut command, last.as_deref());
        let result = dispatcher.dispatch(command).await?;
        if let Some(key) = element_key(&result.value) {
            last = Some(key);
        }
        let failed = !result.is_success();
        results.push(result);
        if failed && stop_on_error {
            warn!("stopping at the first failure");
            break;
        }
    }
    Ok(results)
}

fn substitute(command: &mut Command, last: Option<&str>) {
    let Some(last) = last else { return };
    for id in [&mut command.element_id, &mut command.dest_element_id] {
        if id.as_deref() == Some(LAST_ELEMENT) {
            *id = Some(last.to_string());
        }
    }
    for name in ["elementId", "destElId", "context"] {
        if let Some(value) = command.params.get_mut(name) {
            if value.as_str() == Some(LAST_ELEMENT) {
                *value = Value::String(last.to_string());
            }
        }
    }
}

/// Key of a single found element, or of the first one in a list.
fn element_key(value: &Value) -> Option<String> {
    let element = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    element.get("ELEMENT")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_bridge::{AgentSettings, WdStatus};
    use device_adapter::{NodeSpec, VirtualScreen};
    use serde_json::json;

    fn screen() -> VirtualScreen {
        VirtualScreen::new(
            NodeSpec::new("android.widget.FrameLayout")
                .bounds(0, 0, 720, 1280)
                .child(
                    NodeSpec::new("android.widget.EditText")
                        .text("draft")
                        .bounds(0, 0, 720, 100),
                ),
        )
    }

    fn script(raw: Value) -> Vec<Command> {
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn last_found_element_is_substituted() {
        let screen = screen();
        let dispatcher = build_dispatcher(Arc::new(screen.clone()), AgentSettings::default())
            .await
            .unwrap();
        let commands = script(json!([
            {"action": "find", "params": {"strategy": "class name", "selector": "android.widget.EditText"}},
            {"action": "element:setText", "elementId": "$last", "params": {"text": "done", "replace": true}},
            {"action": "element:getText", "params": {"elementId": "$last"}}
        ]));
        let results = replay(&dispatcher, commands, true).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(CommandResult::is_success));
        assert_eq!(results[2].value, json!("done"));
    }

    #[tokio::test]
    async fn stop_on_error_halts_the_script() {
        let dispatcher = build_dispatcher(Arc::new(screen()), AgentSettings::default())
            .await
            .unwrap();
        let commands = script(json!([
            {"action": "find", "params": {"strategy": "class name", "selector": "android.widget.Switch"}},
            {"action": "pressBack"}
        ]));
        let results = replay(&dispatcher, commands.clone(), true).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, WdStatus::NoSuchElement);

        let results = replay(&dispatcher, commands, false).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn element_keys_come_from_single_or_list_results() {
        assert_eq!(element_key(&json!({"ELEMENT": "3"})).as_deref(), Some("3"));
        assert_eq!(element_key(&json!([{"ELEMENT": "4"}])).as_deref(), Some("4"));
        assert_eq!(element_key(&json!("text")), None);
    }
}
