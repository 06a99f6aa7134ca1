use action_primitives::{DragTarget, GestureConfig, PinchDirection};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use uiauto_core_types::UiSelector;

use super::{position, required_position, steps};
use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

/// `element:drag` drags the element (to `destElId` or `endX`/`endY`);
/// `drag` goes from `startX`/`startY` on screen.
pub struct DragHandler {
    action: &'static str,
    on_element: bool,
}

impl DragHandler {
    pub const ELEMENT: Self = Self {
        action: "element:drag",
        on_element: true,
    };
    pub const SCREEN: Self = Self {
        action: "drag",
        on_element: false,
    };
}

#[async_trait]
impl CommandHandler for DragHandler {
    fn action(&self) -> &'static str {
        self.action
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let gestures = ctx.gestures();
        let steps = steps(command, gestures.config(), GestureConfig::drag_steps)?;
        let element = if self.on_element {
            Some(ctx.element(command).await?)
        } else {
            None
        };
        let destination = match command.dest_element_key() {
            Some(key) => Some(ctx.cache().resolve(&key).await?),
            None => None,
        };

        let from = match &element {
            Some(element) => element.bounds().await?.center(),
            None => {
                gestures
                    .resolve(position(command, "startX", "startY")?, None)
                    .await?
            }
        };
        let to = match &destination {
            Some(dest) => DragTarget::Element(dest.as_ref()),
            None => DragTarget::Point(
                gestures
                    .resolve(required_position(command, "endX", "endY")?, None)
                    .await?,
            ),
        };
        gestures.drag(element.as_deref(), from, to, steps).await?;
        Ok(Value::Bool(true))
    }
}

/// Swipe between two positions, resolved against the element when there is
/// one and against the screen otherwise.
pub struct SwipeHandler {
    action: &'static str,
    on_element: bool,
}

impl SwipeHandler {
    pub const ELEMENT: Self = Self {
        action: "element:swipe",
        on_element: true,
    };
    pub const SCREEN: Self = Self {
        action: "swipe",
        on_element: false,
    };
}

#[async_trait]
impl CommandHandler for SwipeHandler {
    fn action(&self) -> &'static str {
        self.action
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let gestures = ctx.gestures();
        let steps = steps(command, gestures.config(), GestureConfig::swipe_steps)?;
        let element = if self.on_element {
            Some(ctx.element(command).await?)
        } else {
            None
        };
        let start = position(command, "startX", "startY")?;
        let end = required_position(command, "endX", "endY")?;
        let from = gestures.resolve(start, element.as_deref()).await?;
        let to = gestures.resolve(end, element.as_deref()).await?;
        gestures.swipe(from, to, steps).await?;
        Ok(Value::Bool(true))
    }
}

/// `element:flick` uses `xoffset`/`yoffset`/`speed`; `flick` uses
/// `xSpeed`/`ySpeed` from the screen center.
pub struct FlickHandler {
    action: &'static str,
    on_element: bool,
}

impl FlickHandler {
    pub const ELEMENT: Self = Self {
        action: "element:flick",
        on_element: true,
    };
    pub const SCREEN: Self = Self {
        action: "flick",
        on_element: false,
    };
}

#[async_trait]
impl CommandHandler for FlickHandler {
    fn action(&self) -> &'static str {
        self.action
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        if self.on_element {
            let element = ctx.element(command).await?;
            ctx.gestures()
                .flick_element(
                    element.as_ref(),
                    command.f64("xoffset")?,
                    command.f64("yoffset")?,
                    command.f64("speed")?,
                )
                .await?;
        } else {
            ctx.gestures()
                .flick_screen(command.f64_or("xSpeed", 0.0)?, command.f64_or("ySpeed", 0.0)?)
                .await?;
        }
        Ok(Value::Bool(true))
    }
}

/// `direction` is `in` or `out`; `percent` of the element's half width is
/// the widest finger spread.
pub struct PinchHandler;

const DEFAULT_PINCH_PERCENT: f64 = 100.0;
const DEFAULT_PINCH_STEPS: u32 = 50;

#[async_trait]
impl CommandHandler for PinchHandler {
    fn action(&self) -> &'static str {
        "element:pinch"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.element(command).await?;
        let direction: PinchDirection = command.parse("direction")?;
        let percent = command.f64_or("percent", DEFAULT_PINCH_PERCENT)?;
        let steps = command.u32_or("steps", DEFAULT_PINCH_STEPS)?;
        ctx.gestures()
            .pinch(element.as_ref(), direction, percent, steps)
            .await?;
        Ok(Value::Bool(true))
    }
}

/// `element:scrollTo`: the element is the scrollable container; scrolls
/// until a node with `text` (or that description) is on screen.
pub struct ScrollToHandler;

#[async_trait]
impl CommandHandler for ScrollToHandler {
    fn action(&self) -> &'static str {
        "element:scrollTo"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let container = ctx.element(command).await?;
        let text = command.str("text")?;
        let scope = container.selector().clone();
        for target in [
            UiSelector::new().text(text),
            UiSelector::new().description(text),
        ] {
            if ctx.device().scroll_into_view(&scope, &target).await? {
                info!(text, "scrolled into view");
                return Ok(Value::Bool(true));
            }
        }
        Err(CommandError::ActionFailed(format!(
            "Could not scroll '{text}' into view"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{context, find, run, screen};
    use device_adapter::EventKind;
    use uiauto_core_types::Point;

    fn last_event(screen: &device_adapter::VirtualScreen) -> Option<EventKind> {
        screen.events().last().map(|e| e.kind.clone())
    }

    #[tokio::test]
    async fn screen_swipe_uses_explicit_steps() {
        let screen = screen();
        let ctx = context(&screen);
        let cmd = Command::new("swipe")
            .param("startX", 0.5)
            .param("startY", 0.75)
            .param("endX", 0.5)
            .param("endY", 0.25)
            .param("steps", 12);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            last_event(&screen),
            Some(EventKind::Swipe {
                from: Point::new(500.0, 1500.0),
                to: Point::new(500.0, 500.0),
                steps: 12
            })
        );
    }

    #[tokio::test]
    async fn element_swipe_derives_steps_from_duration() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "accessibility id", "confirm").await;
        let cmd = Command::new("element:swipe")
            .on(key.as_str())
            .param("startX", 0.1)
            .param("endX", 0.9)
            .param("endY", 0)
            .param("duration", 1.0);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            last_event(&screen),
            Some(EventKind::Swipe {
                from: Point::new(120.0, 350.0),
                to: Point::new(280.0, 350.0),
                steps: 28
            })
        );
    }

    #[tokio::test]
    async fn drag_to_destination_element() {
        let screen = screen();
        let ctx = context(&screen);
        let source = find(&ctx, "accessibility id", "confirm").await;
        let target = find(&ctx, "class name", "android.widget.EditText").await;
        let mut cmd = Command::new("element:drag").on(source.as_str()).param("steps", 5);
        cmd.dest_element_id = Some(target);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            last_event(&screen),
            Some(EventKind::Drag {
                from: Point::new(200.0, 350.0),
                to: Point::new(500.0, 150.0),
                steps: 5
            })
        );
    }

    #[tokio::test]
    async fn failed_drag_is_surfaced() {
        let screen = screen();
        let ctx = context(&screen);
        screen.set_gestures_fail(true);
        let cmd = Command::new("drag")
            .param("startX", 10)
            .param("startY", 10)
            .param("endX", 200)
            .param("endY", 200);
        let err = run(&ctx, cmd).await.unwrap_err();
        assert!(matches!(err, CommandError::ActionFailed(_)));
    }

    #[tokio::test]
    async fn pinch_goes_through_the_element() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "accessibility id", "confirm").await;
        let cmd = Command::new("element:pinch")
            .on(key.as_str())
            .param("direction", "in")
            .param("percent", 50)
            .param("steps", 10);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            last_event(&screen),
            Some(EventKind::MultiPointer { fingers: 2, frames: 11 })
        );

        let bad = Command::new("element:pinch")
            .on(key.as_str())
            .param("direction", "sideways");
        assert!(matches!(
            run(&ctx, bad).await.unwrap_err(),
            CommandError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn screen_flick_swipes_from_the_center() {
        let screen = screen();
        let ctx = context(&screen);
        let cmd = Command::new("flick").param("xSpeed", 0).param("ySpeed", -500);
        run(&ctx, cmd).await.unwrap();
        assert_eq!(
            last_event(&screen),
            Some(EventKind::Swipe {
                from: Point::new(500.0, 1000.0),
                to: Point::new(500.0, 750.0),
                steps: 3
            })
        );
    }

    #[tokio::test]
    async fn oversized_gestures_are_invalid_requests() {
        let screen = screen();
        let ctx = context(&screen);
        let key = find(&ctx, "accessibility id", "confirm").await;
        let commands = [
            Command::new("flick").param("xSpeed", 1e-300).param("ySpeed", 0),
            Command::new("element:flick")
                .on(key.as_str())
                .param("xoffset", 10)
                .param("yoffset", 0)
                .param("speed", 1e-300),
            Command::new("element:pinch")
                .on(key.as_str())
                .param("direction", "out")
                .param("steps", 4_000_000_000_u64),
            Command::new("swipe")
                .param("startX", 10)
                .param("startY", 10)
                .param("endX", 20)
                .param("endY", 20)
                .param("duration", 1e300),
            Command::new("drag")
                .param("startX", 10)
                .param("startY", 10)
                .param("endX", 20)
                .param("endY", 20)
                .param("steps", 20_000),
        ];
        for cmd in commands {
            let action = cmd.action.clone();
            let err = run(&ctx, cmd).await.unwrap_err();
            assert!(matches!(err, CommandError::InvalidRequest(_)), "{action}: {err}");
        }
        assert!(screen.events().is_empty());
    }

    #[tokio::test]
    async fn scroll_to_reveals_text_in_the_container() {
        let screen = screen();
        let ctx = context(&screen);
        let list = find(&ctx, "class name", "android.widget.ListView").await;
        let cmd = Command::new("element:scrollTo")
            .on(list.as_str())
            .param("text", "Row 99");
        assert_eq!(run(&ctx, cmd).await.unwrap(), Value::Bool(true));

        let missing = Command::new("element:scrollTo")
            .on(list.as_str())
            .param("text", "Row 500");
        assert!(matches!(
            run(&ctx, missing).await.unwrap_err(),
            CommandError::ActionFailed(_)
        ));
    }
}
