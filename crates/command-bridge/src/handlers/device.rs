use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;
use uiauto_core_types::Orientation;

use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

pub struct PressBackHandler;

#[async_trait]
impl CommandHandler for PressBackHandler {
    fn action(&self) -> &'static str {
        "pressBack"
    }

    async fn execute(&self, ctx: &AgentContext, _command: &Command) -> Result<Value, CommandError> {
        Ok(Value::Bool(ctx.device().press_back().await?))
    }
}

/// `keycode` with an optional `metastate` bit set.
pub struct PressKeyCodeHandler;

#[async_trait]
impl CommandHandler for PressKeyCodeHandler {
    fn action(&self) -> &'static str {
        "pressKeyCode"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let code = command.i32("keycode")?;
        let meta = if command.has("metastate") {
            command.i32("metastate")?
        } else {
            0
        };
        Ok(Value::Bool(ctx.device().press_key_code(code, meta).await?))
    }
}

pub struct DeviceSizeHandler;

#[async_trait]
impl CommandHandler for DeviceSizeHandler {
    fn action(&self) -> &'static str {
        "getDeviceSize"
    }

    async fn execute(&self, ctx: &AgentContext, _command: &Command) -> Result<Value, CommandError> {
        let size = ctx.device().display_size().await?;
        Ok(json!({ "width": size.width, "height": size.height }))
    }
}

/// `timeout` in milliseconds, the configured idle timeout otherwise.
pub struct WaitForIdleHandler;

#[async_trait]
impl CommandHandler for WaitForIdleHandler {
    fn action(&self) -> &'static str {
        "waitForIdle"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let timeout = if command.has("timeout") {
            let ms = command.f64("timeout")?;
            if !ms.is_finite() || ms < 0.0 {
                return Err(CommandError::invalid_param("timeout", "a non-negative number"));
            }
            Duration::from_millis(ms as u64)
        } else {
            ctx.settings().wait_for_idle()
        };
        ctx.device().wait_for_idle(timeout).await?;
        Ok(Value::Bool(true))
    }
}

pub struct DumpHierarchyHandler;

#[async_trait]
impl CommandHandler for DumpHierarchyHandler {
    fn action(&self) -> &'static str {
        "dumpWindowHierarchy"
    }

    async fn execute(&self, ctx: &AgentContext, _command: &Command) -> Result<Value, CommandError> {
        let xml = ctx
            .device()
            .dump_window_hierarchy(ctx.compressed_layout())
            .await?;
        Ok(Value::String(xml))
    }
}

/// Toggles whether hierarchy dumps leave out unimportant layout nodes.
pub struct CompressedLayoutHandler;

#[async_trait]
impl CommandHandler for CompressedLayoutHandler {
    fn action(&self) -> &'static str {
        "enableCompressedLayoutHierarchy"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let compressed = command.bool_or("compressLayout", true)?;
        ctx.set_compressed_layout(compressed);
        info!(compressed, "hierarchy compression changed");
        Ok(Value::Bool(compressed))
    }
}

pub struct GetStringsHandler;

#[async_trait]
impl CommandHandler for GetStringsHandler {
    fn action(&self) -> &'static str {
        "getStrings"
    }

    async fn execute(&self, ctx: &AgentContext, _command: &Command) -> Result<Value, CommandError> {
        let entries = ctx
            .strings()
            .snapshot()
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Ok(Value::Object(entries))
    }
}

/// Replaces the string table from an inline `strings` object, a `path`, or
/// the configured strings file, in that order. Returns the entry count.
pub struct UpdateStringsHandler;

#[async_trait]
impl CommandHandler for UpdateStringsHandler {
    fn action(&self) -> &'static str {
        "updateStrings"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        if command.has("strings") {
            let strings = command.value("strings")?;
            if !strings.is_object() {
                return Err(CommandError::invalid_param("strings", "an object"));
            }
            let count = ctx.strings().replace_json(&strings.to_string())?;
            info!(count, "replaced string resources");
            return Ok(json!(count));
        }
        let path = match command.opt_str("path") {
            Some(path) => PathBuf::from(path),
            None => ctx.settings().strings_path.clone().ok_or_else(|| {
                CommandError::InvalidRequest(
                    "no 'strings', no 'path' and no configured strings file".to_string(),
                )
            })?,
        };
        Ok(json!(ctx.load_strings(&path).await?))
    }
}

/// Reads the orientation, or sets it first when `orientation` is given.
pub struct OrientationHandler;

#[async_trait]
impl CommandHandler for OrientationHandler {
    fn action(&self) -> &'static str {
        "orientation"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        if let Some(requested) = command.opt_str("orientation") {
            let orientation = Orientation::parse(requested).ok_or_else(|| {
                CommandError::InvalidRequest(format!("Invalid rotation: {requested}"))
            })?;
            ctx.device().set_orientation(orientation).await?;
        }
        let current = ctx.device().orientation().await?;
        Ok(Value::String(current.as_str().to_string()))
    }
}

pub struct WakeHandler;

#[async_trait]
impl CommandHandler for WakeHandler {
    fn action(&self) -> &'static str {
        "wake"
    }

    async fn execute(&self, ctx: &AgentContext, _command: &Command) -> Result<Value, CommandError> {
        ctx.device().wake_up().await?;
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{context, run, screen};
    use crate::model::WdStatus;
    use device_adapter::EventKind;

    #[tokio::test]
    async fn key_presses_reach_the_device() {
        let screen = screen();
        let ctx = context(&screen);
        run(&ctx, Command::new("pressBack")).await.unwrap();
        let cmd = Command::new("pressKeyCode")
            .param("keycode", 29)
            .param("metastate", 1);
        run(&ctx, cmd).await.unwrap();
        let kinds: Vec<_> = screen.events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Back, EventKind::Key { code: 29, meta: 1 }]);

        let err = run(&ctx, Command::new("pressKeyCode")).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn compressed_flag_changes_the_dump() {
        let screen = screen();
        let ctx = context(&screen);
        let full = run(&ctx, Command::new("dumpWindowHierarchy")).await.unwrap();
        let enabled = run(&ctx, Command::new("enableCompressedLayoutHierarchy"))
            .await
            .unwrap();
        assert_eq!(enabled, Value::Bool(true));
        assert!(ctx.compressed_layout());
        let compressed = run(&ctx, Command::new("dumpWindowHierarchy")).await.unwrap();
        assert!(full.as_str().unwrap().starts_with("<?xml"));
        assert!(compressed.as_str().unwrap().len() <= full.as_str().unwrap().len());

        let disabled = Command::new("enableCompressedLayoutHierarchy").param("compressLayout", false);
        assert_eq!(run(&ctx, disabled).await.unwrap(), Value::Bool(false));
        assert!(!ctx.compressed_layout());
    }

    #[tokio::test]
    async fn strings_are_replaced_inline_or_from_a_file() {
        let screen = screen();
        let ctx = context(&screen);
        assert_eq!(run(&ctx, Command::new("getStrings")).await.unwrap(), json!({}));

        let inline = Command::new("updateStrings").param("strings", json!({"ok": "OK"}));
        assert_eq!(run(&ctx, inline).await.unwrap(), json!(1));
        assert_eq!(
            run(&ctx, Command::new("getStrings")).await.unwrap(),
            json!({"ok": "OK"})
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.json");
        std::fs::write(&path, r#"{"a": "1", "b": "2"}"#).unwrap();
        let from_file = Command::new("updateStrings").param("path", path.to_str().unwrap());
        assert_eq!(run(&ctx, from_file).await.unwrap(), json!(2));
        assert_eq!(ctx.strings().len(), 2);

        let err = run(&ctx, Command::new("updateStrings")).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn orientation_reads_and_sets() {
        let screen = screen();
        let ctx = context(&screen);
        assert_eq!(run(&ctx, Command::new("orientation")).await.unwrap(), "PORTRAIT");
        let rotate = Command::new("orientation").param("orientation", "landscape");
        assert_eq!(run(&ctx, rotate).await.unwrap(), "LANDSCAPE");

        let bad = Command::new("orientation").param("orientation", "UPSIDE_DOWN");
        let err = run(&ctx, bad).await.unwrap_err();
        assert_eq!(err.status(), WdStatus::UnknownError);
    }

    #[tokio::test]
    async fn idle_wake_and_size() {
        let screen = screen();
        let ctx = context(&screen);
        let size = run(&ctx, Command::new("getDeviceSize")).await.unwrap();
        assert_eq!(size, json!({"width": 1000, "height": 2000}));
        run(&ctx, Command::new("waitForIdle").param("timeout", 100)).await.unwrap();
        run(&ctx, Command::new("wake")).await.unwrap();
        let kinds: Vec<_> = screen.events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::WaitForIdle, EventKind::Wake]);
    }
}
