//! Built-in command handlers, one struct per action.

mod clear;
mod device;
mod element;
mod find;
mod gestures;
mod touch;

use std::time::Duration;

use action_primitives::{GestureConfig, Position};
use serde_json::{json, Value};
use uiauto_core_types::{ElementKey, Rect};

use crate::errors::CommandError;
use crate::model::Command;

pub use clear::ClearHandler;
pub use device::{
    CompressedLayoutHandler, DeviceSizeHandler, DumpHierarchyHandler, GetStringsHandler,
    OrientationHandler, PressBackHandler, PressKeyCodeHandler, UpdateStringsHandler,
    WaitForIdleHandler, WakeHandler,
};
pub use element::{
    ClickHandler, GetAttributeHandler, GetLocationHandler, GetSizeHandler, GetTextHandler,
    SetTextHandler,
};
pub use find::FindHandler;
pub use gestures::{DragHandler, FlickHandler, PinchHandler, ScrollToHandler, SwipeHandler};
pub use touch::{
    MultiPointerGestureHandler, TouchDownHandler, TouchLongClickHandler, TouchMoveHandler,
    TouchUpHandler,
};

/// Gesture length assumed when a command carries neither steps nor duration.
const DEFAULT_GESTURE_SECS: f64 = 0.5;

/// `{x, y}` from two params; a missing axis means the middle.
fn position(command: &Command, x: &str, y: &str) -> Result<Position, CommandError> {
    Ok(Position::new(command.f64_or(x, 0.0)?, command.f64_or(y, 0.0)?))
}

fn required_position(command: &Command, x: &str, y: &str) -> Result<Position, CommandError> {
    Ok(Position::new(command.f64(x)?, command.f64(y)?))
}

/// Explicit `steps`, else derived from `duration` (seconds) and the
/// configured per-second rate.
fn steps(
    command: &Command,
    config: &GestureConfig,
    rate: fn(&GestureConfig, Duration) -> u32,
) -> Result<u32, CommandError> {
    if command.has("steps") {
        return Ok(command.u32_or("steps", 1)?.max(1));
    }
    let secs = command.f64_or("duration", DEFAULT_GESTURE_SECS)?;
    Ok(rate(config, config.check_secs(secs)?))
}

fn element_json(key: &ElementKey) -> Value {
    json!({ "ELEMENT": key })
}

fn size_json(rect: Rect) -> Value {
    json!({ "width": rect.width(), "height": rect.height() })
}
