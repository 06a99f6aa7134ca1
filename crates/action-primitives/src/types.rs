//! Core data types for gesture synthesis

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uiauto_core_types::Point;

use crate::errors::ActionError;

/// Sampling rate of synthesized multi-pointer gestures.
pub const FRAMES_PER_SECOND: f64 = 200.0;

/// Spacing between two injected frames (1 / `FRAMES_PER_SECOND`).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(5);

/// Frames added on top of the sampled duration so even a zero-length
/// gesture injects something.
pub const EXTRA_FRAMES: usize = 2;

/// Distance from the center, in pixels, where pinch fingers meet.
pub const PINCH_MIN_OFFSET: f64 = 20.0;

/// Pointers a multi-touch injection can carry.
pub const MAX_FINGERS: usize = 10;

pub const DEFAULT_MAX_GESTURE_STEPS: u32 = 10_000;

pub const DEFAULT_MAX_GESTURE_DURATION: Duration = Duration::from_secs(60);

/// Logical position as sent by clients.
///
/// Each axis is read on its own: `0` is the middle of the reference area,
/// a magnitude strictly between 0 and 1 is a fraction of its length, and
/// anything else is a pixel offset from its origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One sample of a finger track: where the finger is at `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub time: f64,
    pub touch: Position,
}

/// A sample after its position has been resolved to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub time: f64,
    pub point: Point,
}

impl TimedPoint {
    pub const fn new(time: f64, point: Point) -> Self {
        Self { time, point }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinchDirection {
    /// Fingers move toward each other.
    In,
    /// Fingers move apart.
    Out,
}

/// Timing knobs and size limits for the synthesizer.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    pub long_press: Duration,
    pub swipe_steps_per_sec: u32,
    pub drag_steps_per_sec: u32,
    /// Most steps a drag, swipe, flick or pinch may be split into.
    pub max_steps: u32,
    /// Longest hold or sampled gesture.
    pub max_duration: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(2000),
            swipe_steps_per_sec: 28,
            drag_steps_per_sec: 40,
            max_steps: DEFAULT_MAX_GESTURE_STEPS,
            max_duration: DEFAULT_MAX_GESTURE_DURATION,
        }
    }
}

impl GestureConfig {
    pub fn swipe_steps(&self, duration: Duration) -> u32 {
        steps_for(duration, self.swipe_steps_per_sec)
    }

    pub fn drag_steps(&self, duration: Duration) -> u32 {
        steps_for(duration, self.drag_steps_per_sec)
    }

    /// `steps`, at least one, if within [`GestureConfig::max_steps`].
    pub fn check_steps(&self, steps: u32) -> Result<u32, ActionError> {
        if steps > self.max_steps {
            return Err(ActionError::InvalidArgument(format!(
                "{steps} steps exceed the limit of {}",
                self.max_steps
            )));
        }
        Ok(steps.max(1))
    }

    pub fn check_duration(&self, duration: Duration) -> Result<Duration, ActionError> {
        if duration > self.max_duration {
            return Err(ActionError::InvalidArgument(format!(
                "gesture of {}ms exceeds the limit of {}ms",
                duration.as_millis(),
                self.max_duration.as_millis()
            )));
        }
        Ok(duration)
    }

    /// Gesture length in seconds as sent by clients.
    pub fn check_secs(&self, secs: f64) -> Result<Duration, ActionError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(ActionError::InvalidArgument(format!(
                "gesture time {secs} must be a non-negative number of seconds"
            )));
        }
        match Duration::try_from_secs_f64(secs) {
            Ok(duration) => self.check_duration(duration),
            Err(_) => self.check_duration(Duration::MAX),
        }
    }
}

/// Saturates at `u32::MAX`; callers bound the result with `check_steps`.
fn steps_for(duration: Duration, per_sec: u32) -> u32 {
    ((duration.as_secs_f64() * f64::from(per_sec)).round() as u32).max(1)
}
