use async_trait::async_trait;
use device_adapter::{keycode, UiObject};
use serde_json::{json, Value};
use tracing::{debug, info};
use uiauto_core_types::NodeFlag;

use super::{position, required_position, size_json};
use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

/// `element:click` clicks the element; `click` taps screen coordinates.
pub struct ClickHandler {
    action: &'static str,
    on_element: bool,
}

impl ClickHandler {
    pub const ELEMENT: Self = Self {
        action: "element:click",
        on_element: true,
    };
    pub const SCREEN: Self = Self {
        action: "click",
        on_element: false,
    };
}

#[async_trait]
impl CommandHandler for ClickHandler {
    fn action(&self) -> &'static str {
        self.action
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        if self.on_element {
            let element = ctx.element(command).await?;
            return Ok(Value::Bool(element.click().await?));
        }
        let at = ctx
            .gestures()
            .resolve(required_position(command, "x", "y")?, None)
            .await?;
        Ok(Value::Bool(ctx.device().click(at).await?))
    }
}

/// `element:setText`: appends to the current text unless `replace` is set.
/// A trailing newline is sent as an enter key.
pub struct SetTextHandler;

#[async_trait]
impl CommandHandler for SetTextHandler {
    fn action(&self) -> &'static str {
        "element:setText"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        let mut text = command.str("text")?.to_string();
        let press_enter = text.ends_with('\n');
        if press_enter {
            text.pop();
        }

        if !command.bool_or("replace", false)? {
            let current = element.text().await?;
            element.clear_text().await?;
            // Whatever survives a clear is hint text, not content.
            if element.text().await?.is_empty() {
                text.insert_str(0, &current);
            }
        }

        debug!(len = text.len(), press_enter, "setting text");
        let mut done = element.set_text(&text).await?;
        if press_enter {
            done &= ctx.device().press_key_code(keycode::ENTER, 0).await?;
        }
        Ok(Value::Bool(done))
    }
}

pub struct GetTextHandler;

#[async_trait]
impl CommandHandler for GetTextHandler {
    fn action(&self) -> &'static str {
        "element:getText"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        Ok(Value::String(element.text().await?))
    }
}

/// `element:getAttribute`. Boolean attributes come back as `"true"` /
/// `"false"` strings.
pub struct GetAttributeHandler;

impl GetAttributeHandler {
    async fn read(element: &dyn UiObject, attribute: &str) -> Result<String, CommandError> {
        let value = match attribute {
            "name" | "contentDescription" | "content-desc" => {
                let description = element.content_description().await?;
                if description.is_empty() {
                    element.text().await?
                } else {
                    description
                }
            }
            "text" => element.text().await?,
            "className" | "class" => element.class_name().await?,
            "resourceId" | "resource-id" => element.resource_id().await?,
            "packageName" | "package" => element.package_name().await?,
            "displayed" => element.exists().await?.to_string(),
            other => match NodeFlag::from_name(other) {
                Some(flag) => element.flag(flag).await?.to_string(),
                None => {
                    return Err(CommandError::InvalidRequest(format!(
                        "This element does not have the '{other}' attribute"
                    )))
                }
            },
        };
        Ok(value)
    }
}

#[async_trait]
impl CommandHandler for GetAttributeHandler {
    fn action(&self) -> &'static str {
        "element:getAttribute"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        let attribute = command.str("attribute")?;
        let value = Self::read(element.as_ref(), attribute).await?;
        info!(attribute, "read attribute");
        Ok(Value::String(value))
    }
}

pub struct GetSizeHandler;

#[async_trait]
impl CommandHandler for GetSizeHandler {
    fn action(&self) -> &'static str {
        "element:getSize"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        Ok(size_json(element.bounds().await?))
    }
}

/// `element:getLocation`: top-left corner, or the point a position
/// (`x`, `y`) resolves to inside the element when one is given.
pub struct GetLocationHandler;

#[async_trait]
impl CommandHandler for GetLocationHandler {
    fn action(&self) -> &'static str {
        "element:getLocation"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        if command.has("x") || command.has("y") {
            let at = ctx
                .gestures()
                .resolve(position(command, "x", "y")?, Some(element.as_ref()))
                .await?;
            return Ok(json!({ "x": at.x, "y": at.y }));
        }
        let bounds = element.bounds().await?;
        Ok(json!({ "x": bounds.left, "y": bounds.top }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{context, find, run, screen};
    use crate::model::WdStatus;
    use device_adapter::EventKind;
    use uiauto_core_types::{Point, UiSelector};

    #[tokio::test]
    async fn set_text_appends_unless_replacing() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "class name", "android.widget.EditText").await;
        let field = UiSelector::new().class_name("android.widget.EditText");

        let cmd = Command::new("element:setText").on(key.as_str()).param("text", " world");
        assert_eq!(run(&ctx, cmd).await.unwrap(), Value::Bool(true));
        assert_eq!(screen.raw_text(&field).as_deref(), Some("hello world"));

        let cmd = Command::new("element:setText")
            .on(key.as_str())
            .param("text", "bye\n")
            .param("replace", true);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(screen.raw_text(&field).as_deref(), Some("bye"));
        assert!(screen
            .events()
            .iter()
            .any(|e| e.kind == EventKind::Key { code: keycode::ENTER, meta: 0 }));
    }

    #[tokio::test]
    async fn attributes_read_through_the_facade() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "name", "confirm").await;
        let attr = |name: &str| {
            Command::new("element:getAttribute")
                .on(key.as_str())
                .param("attribute", name)
        };
        assert_eq!(run(&ctx, attr("name")).await.unwrap(), "confirm");
        assert_eq!(run(&ctx, attr("className")).await.unwrap(), "android.widget.Button");
        assert_eq!(run(&ctx, attr("clickable")).await.unwrap(), "true");
        assert_eq!(run(&ctx, attr("checked")).await.unwrap(), "false");
        assert_eq!(run(&ctx, attr("displayed")).await.unwrap(), "true");
        let err = run(&ctx, attr("colour")).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn size_and_location_come_from_bounds() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "accessibility id", "confirm").await;
        let size = run(&ctx, Command::new("element:getSize").on(key.as_str())).await.unwrap();
        assert_eq!(size, json!({"width": 200, "height": 100}));
        let location = run(&ctx, Command::new("element:getLocation").on(key.as_str()))
            .await
            .unwrap();
        assert_eq!(location, json!({"x": 100, "y": 300}));
    }

    #[tokio::test]
    async fn screen_click_resolves_fractions() {
        let screen = screen();
        let ctx = context(&screen);
        let cmd = Command::new("click").param("x", 0.5).param("y", 0.25);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            screen.events().last().map(|e| e.kind.clone()),
            Some(EventKind::Click(Point::new(500.0, 500.0)))
        );
        let err = run(&ctx, Command::new("click").param("x", 5000).param("y", 1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), WdStatus::InvalidElementCoordinates);
    }

    #[tokio::test]
    async fn removed_element_is_stale_and_unknown_key_is_not() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "accessibility id", "confirm").await;
        screen.remove_matching(&UiSelector::new().description("confirm"));
        let err = run(&ctx, Command::new("element:click").on(key.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), WdStatus::StaleElementReference);

        let err = run(&ctx, Command::new("element:click").on("4242")).await.unwrap_err();
        assert_eq!(err.status(), WdStatus::UnknownError);

        let err = run(&ctx, Command::new("element:click")).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidRequest(_)));
    }
}
