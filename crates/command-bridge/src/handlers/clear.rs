//! `element:clear`
//!
//! The platform clear is unreliable, so clearing escalates through three
//! stages and stops at the first one that leaves the field empty:
//! 1. platform `clear_text`
//! 2. long-press to select, tap "Select all" if offered, one delete key
//! 3. tap the field, one delete key per remaining character, repeated
//!    while the text keeps shrinking
//!
//! Between stages, text that a delete key cannot change is taken to be the
//! field's hint and counts as cleared.

use std::time::Duration;

use async_trait::async_trait;
use device_adapter::{keycode, UiObject};
use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::debug;
use uiauto_core_types::{NodeFlag, Point, UiSelector};

use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

/// Horizontal inset of the select long-press from the field's left edge.
const SELECT_INSET: f64 = 20.0;
const SELECT_ALL_TIMEOUT: Duration = Duration::from_millis(2000);
const SELECT_ALL_POLL: Duration = Duration::from_millis(100);
const SELECTION_SETTLE: Duration = Duration::from_millis(500);

pub struct ClearHandler;

impl ClearHandler {
    async fn key(ctx: &AgentContext, code: i32) -> Result<(), CommandError> {
        ctx.device().press_key_code(code, 0).await?;
        Ok(())
    }

    /// Sends a delete around the thumb keys; hint text does not change.
    async fn has_hint_text(ctx: &AgentContext, element: &dyn UiObject) -> Result<bool, CommandError> {
        let before = element.text().await?;
        match element.flag(NodeFlag::Focused).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("element not focused; cannot check for hint text");
                return Ok(false);
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                debug!(error = %err, "cannot check for hint text");
                return Ok(false);
            }
        }
        Self::key(ctx, keycode::BUTTON_THUMBR).await?;
        Self::key(ctx, keycode::DEL).await?;
        Self::key(ctx, keycode::BUTTON_THUMBL).await?;
        Self::key(ctx, keycode::DEL).await?;
        Ok(before == element.text().await?)
    }

    async fn select_and_delete(
        ctx: &AgentContext,
        element: &dyn UiObject,
    ) -> Result<bool, CommandError> {
        let rect = element.visible_bounds().await?;
        let at = Point::new(f64::from(rect.left) + SELECT_INSET, rect.center().y);
        ctx.gestures()
            .long_press(at, Some(ctx.settings().long_press()), Some(element))
            .await?;

        let select_all = UiSelector::new().description_contains("Select all");
        let deadline = Instant::now() + SELECT_ALL_TIMEOUT;
        loop {
            if let Some(button) = ctx.device().find_object(&select_all).await? {
                debug!("tapping select all");
                button.click().await?;
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(SELECT_ALL_POLL).await;
        }

        sleep(SELECTION_SETTLE).await;
        Self::key(ctx, keycode::DEL).await?;
        Ok(element.text().await?.is_empty())
    }

    async fn send_delete_keys(
        ctx: &AgentContext,
        element: &dyn UiObject,
    ) -> Result<bool, CommandError> {
        let mut previous = String::new();
        loop {
            let current = element.text().await?;
            // Stop once deletes stop changing anything.
            if current.is_empty() || current.eq_ignore_ascii_case(&previous) {
                return Ok(current.is_empty());
            }
            element.click().await?;
            for _ in 0..current.chars().count() {
                Self::key(ctx, keycode::DEL).await?;
            }
            previous = current;
        }
    }
}

#[async_trait]
impl CommandHandler for ClearHandler {
    fn action(&self) -> &'static str {
        "element:clear"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let handle = ctx.element(command).await?;
        let element = handle.as_ref();

        debug!("clearing with the platform clear");
        element.clear_text().await?;
        if element.text().await?.is_empty() {
            return Ok(Value::Bool(true));
        }
        if Self::has_hint_text(ctx, element).await? {
            debug!("remaining text is hint text");
            return Ok(Value::Bool(true));
        }

        debug!("clearing by selecting all and deleting");
        if Self::select_and_delete(ctx, element).await? {
            return Ok(Value::Bool(true));
        }
        if Self::has_hint_text(ctx, element).await? {
            debug!("remaining text is hint text");
            return Ok(Value::Bool(true));
        }

        debug!("clearing by sending delete keys");
        if Self::send_delete_keys(ctx, element).await? {
            return Ok(Value::Bool(true));
        }
        if Self::has_hint_text(ctx, element).await? {
            debug!("remaining text is hint text");
            return Ok(Value::Bool(true));
        }

        let remaining = element.text().await?;
        debug!(remaining = %remaining, "exhausted every way to clear the text");
        Err(CommandError::InvalidElementState(
            "Clear text not successful.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{context, run};
    use device_adapter::{EventKind, NodeSpec, VirtualScreen};

    const FIELD: &str = "android.widget.EditText";

    fn field_screen(field: NodeSpec, extra: Option<NodeSpec>) -> VirtualScreen {
        let mut root = NodeSpec::new("android.widget.FrameLayout")
            .bounds(0, 0, 1000, 2000)
            .child(field.bounds(0, 100, 1000, 200));
        if let Some(extra) = extra {
            root = root.child(extra);
        }
        VirtualScreen::new(root)
    }

    async fn clear(screen: &VirtualScreen) -> Result<Value, CommandError> {
        let ctx = context(screen);
        let key = crate::handlers::testing::find(&ctx, "class name", FIELD).await;
        run(&ctx, Command::new("element:clear").on(key.as_str())).await
    }

    #[tokio::test(start_paused = true)]
    async fn platform_clear_is_enough_for_plain_fields() {
        let screen = field_screen(NodeSpec::new(FIELD).text("hello"), None);
        assert_eq!(clear(&screen).await.unwrap(), Value::Bool(true));
        assert!(screen.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_field_is_cleared_by_long_press_select() {
        let screen = field_screen(NodeSpec::new(FIELD).text("hello").clear_resists(), None);
        assert_eq!(clear(&screen).await.unwrap(), Value::Bool(true));
        assert_eq!(
            screen.raw_text(&UiSelector::new().class_name(FIELD)).as_deref(),
            Some("")
        );

        let events = screen.events();
        let down = events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Down(_)))
            .unwrap();
        let up = events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Up(_)))
            .unwrap();
        assert_eq!(down.kind, EventKind::Down(Point::new(20.0, 150.0)));
        assert!(up.at - down.at >= Duration::from_millis(2000));
        assert_eq!(
            events.last().map(|e| e.kind.clone()),
            Some(EventKind::Key { code: keycode::DEL, meta: 0 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hint_text_counts_as_cleared() {
        let screen = field_screen(NodeSpec::new(FIELD).hint("Search"), None);
        assert_eq!(clear(&screen).await.unwrap(), Value::Bool(true));
        assert!(screen
            .events()
            .iter()
            .any(|e| e.kind == EventKind::Key { code: keycode::BUTTON_THUMBR, meta: 0 }));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_keys_finish_what_select_all_missed() {
        // Tapping "Select all" moves focus off the field, so the single
        // delete lands elsewhere and the per-character deletes do the work.
        let select_all = NodeSpec::new("android.widget.TextView")
            .description("Select all")
            .bounds(0, 300, 200, 400);
        let screen = field_screen(
            NodeSpec::new(FIELD).text("abc").clear_resists(),
            Some(select_all),
        );
        assert_eq!(clear(&screen).await.unwrap(), Value::Bool(true));
        let deletes = screen
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Key { code: keycode::DEL, meta: 0 })
            .count();
        assert!(deletes >= 4);
        assert_eq!(
            screen.raw_text(&UiSelector::new().class_name(FIELD)).as_deref(),
            Some("")
        );
    }
}
