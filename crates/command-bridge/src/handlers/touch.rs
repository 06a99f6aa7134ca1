use std::time::Duration;

use action_primitives::TouchSample;
use async_trait::async_trait;
use device_adapter::UiObject;
use serde_json::Value;
use uiauto_core_types::Point;

use super::{position, required_position};
use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

/// With an element, `x`/`y` are relative to it and default to its center;
/// without one they are required screen coordinates.
async fn touch_point(
    ctx: &AgentContext,
    command: &Command,
    element: Option<&dyn UiObject>,
) -> Result<Point, CommandError> {
    match element {
        Some(element) => Ok(ctx
            .gestures()
            .resolve(position(command, "x", "y")?, Some(element))
            .await?),
        None => Ok(ctx
            .gestures()
            .resolve(required_position(command, "x", "y")?, None)
            .await?),
    }
}

pub struct TouchDownHandler;

#[async_trait]
impl CommandHandler for TouchDownHandler {
    fn action(&self) -> &'static str {
        "element:touchDown"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.optional_element(command).await?;
        let at = touch_point(ctx, command, element.as_deref()).await?;
        Ok(Value::Bool(ctx.gestures().down(at).await?))
    }
}

pub struct TouchUpHandler;

#[async_trait]
impl CommandHandler for TouchUpHandler {
    fn action(&self) -> &'static str {
        "element:touchUp"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.optional_element(command).await?;
        let at = touch_point(ctx, command, element.as_deref()).await?;
        Ok(Value::Bool(ctx.gestures().up(at).await?))
    }
}

pub struct TouchMoveHandler;

#[async_trait]
impl CommandHandler for TouchMoveHandler {
    fn action(&self) -> &'static str {
        "element:touchMove"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.optional_element(command).await?;
        let at = touch_point(ctx, command, element.as_deref()).await?;
        Ok(Value::Bool(ctx.gestures().move_to(at).await?))
    }
}

/// `duration` is in milliseconds; the configured long-press length applies
/// when it is absent.
pub struct TouchLongClickHandler;

#[async_trait]
impl CommandHandler for TouchLongClickHandler {
    fn action(&self) -> &'static str {
        "element:touchLongClick"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let element = ctx.optional_element(command).await?;
        let at = touch_point(ctx, command, element.as_deref()).await?;
        let duration = if command.has("duration") {
            let ms = command.f64("duration")?;
            if !ms.is_finite() || ms < 0.0 {
                return Err(CommandError::invalid_param("duration", "a non-negative number"));
            }
            Some(Duration::from_millis(ms as u64))
        } else {
            None
        };
        let pressed = ctx
            .gestures()
            .long_press(at, duration, element.as_deref())
            .await?;
        Ok(Value::Bool(pressed))
    }
}

/// `actions`: one array of `{time, touch: {x, y}}` samples per finger.
pub struct MultiPointerGestureHandler;

#[async_trait]
impl CommandHandler for MultiPointerGestureHandler {
    fn action(&self) -> &'static str {
        "performMultiPointerGesture"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let fingers: Vec<Vec<TouchSample>> = command.parse("actions")?;
        let element = ctx.optional_element(command).await?;
        let frames = ctx
            .gestures()
            .frames_for(&fingers, element.as_deref())
            .await?;
        ctx.gestures()
            .multi_pointer(&frames, element.as_deref())
            .await?;
        Ok(Value::Bool(true))
    }
}
