//! Gesture synthesizer
//!
//! Turns logical gestures into pointer events on a [`UiDevice`]:
//! 1. down / up / move - raw injection through the touch controller
//! 2. long_press - explicit down, sleep, up; element long-click as fallback
//! 3. multi_pointer - frame matrix from per-finger samples
//! 4. pinch - two-finger instance of the multi-pointer path
//! 5. drag / swipe / flick - shared coordinate resolution, one primitive call

use std::sync::Arc;
use std::time::Duration;

use device_adapter::{TouchController, UiDevice, UiObject};
use tracing::{debug, info, warn};
use uiauto_core_types::{Point, PointerFrames, Rect};

use crate::errors::ActionError;
use crate::frames;
use crate::position::resolve_point;
use crate::types::{GestureConfig, PinchDirection, Position, TimedPoint, TouchSample};

/// Scales flick step counts: `steps = FLICK_STEP_BASE / speed + 1`.
const FLICK_STEP_BASE: f64 = 1250.0;

/// Where a drag ends.
pub enum DragTarget<'a> {
    Point(Point),
    Element(&'a dyn UiObject),
}

pub struct GestureSynthesizer {
    device: Arc<dyn UiDevice>,
    config: GestureConfig,
}

impl GestureSynthesizer {
    pub fn new(device: Arc<dyn UiDevice>, config: GestureConfig) -> Self {
        Self { device, config }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    fn touch(&self, what: &str) -> Result<Arc<dyn TouchController>, ActionError> {
        self.device
            .touch_controller()
            .ok_or_else(|| ActionError::NotSupported(format!("{what} needs pointer injection")))
    }

    pub async fn screen_rect(&self) -> Result<Rect, ActionError> {
        let size = self.device.display_size().await?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }

    /// Resolves `position` against the element's bounds, or the whole screen
    /// when no element is given.
    pub async fn resolve(
        &self,
        position: Position,
        element: Option<&dyn UiObject>,
    ) -> Result<Point, ActionError> {
        match element {
            Some(element) => Ok(resolve_point(position, element.bounds().await?, false)?),
            None => resolve_point(position, self.screen_rect().await?, true),
        }
    }

    pub async fn down(&self, at: Point) -> Result<bool, ActionError> {
        debug!(%at, "pointer down");
        Ok(self.touch("touch down")?.down(at).await?)
    }

    pub async fn up(&self, at: Point) -> Result<bool, ActionError> {
        debug!(%at, "pointer up");
        Ok(self.touch("touch up")?.up(at).await?)
    }

    pub async fn move_to(&self, at: Point) -> Result<bool, ActionError> {
        debug!(%at, "pointer move");
        Ok(self.touch("touch move")?.move_to(at).await?)
    }

    /// Holds a pointer at `at` for `duration`. Without pointer injection the
    /// element's own long-click is used; bare coordinates then fail.
    pub async fn long_press(
        &self,
        at: Point,
        duration: Option<Duration>,
        element: Option<&dyn UiObject>,
    ) -> Result<bool, ActionError> {
        let duration = self
            .config
            .check_duration(duration.unwrap_or(self.config.long_press))?;
        match self.device.touch_controller() {
            Some(touch) => {
                info!(%at, duration_ms = duration.as_millis() as u64, "long press");
                if !touch.down(at).await? {
                    return Ok(false);
                }
                tokio::time::sleep(duration).await;
                Ok(touch.up(at).await?)
            }
            None => match element {
                Some(element) => {
                    warn!("pointer injection unavailable; using element long click");
                    Ok(element.long_click().await?)
                }
                None => Err(ActionError::NotSupported(
                    "long press on coordinates needs pointer injection".to_string(),
                )),
            },
        }
    }

    /// Resolves every finger's samples and resamples them into frames.
    pub async fn frames_for(
        &self,
        fingers: &[Vec<TouchSample>],
        element: Option<&dyn UiObject>,
    ) -> Result<PointerFrames, ActionError> {
        let mut tracks = Vec::with_capacity(fingers.len());
        for samples in fingers {
            let mut track = Vec::with_capacity(samples.len());
            for sample in samples {
                let point = self.resolve(sample.touch, element).await?;
                track.push(TimedPoint::new(sample.time, point));
            }
            tracks.push(track);
        }
        frames::synthesize(&tracks, self.config.max_duration)
    }

    /// Injects `frames`, through the element when one is given.
    pub async fn multi_pointer(
        &self,
        frames: &PointerFrames,
        element: Option<&dyn UiObject>,
    ) -> Result<(), ActionError> {
        info!(
            fingers = frames.finger_count(),
            frames = frames.frame_count(),
            "multi-pointer gesture"
        );
        let performed = match element {
            Some(element) => element.perform_multi_pointer_gesture(frames).await?,
            None => self.touch("multi-pointer gesture")?.multi_pointer(frames).await?,
        };
        ensure(performed, "multi-pointer gesture")
    }

    /// `percent` of half the element's visible width is the widest finger
    /// spread.
    pub async fn pinch(
        &self,
        element: &dyn UiObject,
        direction: PinchDirection,
        percent: f64,
        steps: u32,
    ) -> Result<(), ActionError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ActionError::InvalidArgument(format!(
                "pinch percent {percent} must be between 0 and 100"
            )));
        }
        let steps = self.config.check_steps(steps)?;
        let rect = element.visible_bounds().await?;
        let reach = f64::from(rect.width()) / 2.0 * percent / 100.0;
        let frames = frames::pinch(rect.center(), reach, direction, steps);
        self.multi_pointer(&frames, Some(element)).await
    }

    /// Drags from `from` (or the element's center) to `to`.
    pub async fn drag(
        &self,
        element: Option<&dyn UiObject>,
        from: Point,
        to: DragTarget<'_>,
        steps: u32,
    ) -> Result<(), ActionError> {
        let steps = self.config.check_steps(steps)?;
        let performed = match (element, to) {
            (Some(element), DragTarget::Element(dest)) => {
                element.drag_to_object(dest, steps).await?
            }
            (Some(element), DragTarget::Point(to)) => element.drag_to_point(to, steps).await?,
            (None, DragTarget::Element(dest)) => {
                let to = dest.bounds().await?.center();
                self.device.drag(from, to, steps).await?
            }
            (None, DragTarget::Point(to)) => self.device.drag(from, to, steps).await?,
        };
        info!(%from, steps, performed, "drag");
        ensure(performed, "drag")
    }

    pub async fn swipe(&self, from: Point, to: Point, steps: u32) -> Result<(), ActionError> {
        let steps = self.config.check_steps(steps)?;
        let performed = self.device.swipe(from, to, steps).await?;
        info!(%from, %to, steps, performed, "swipe");
        ensure(performed, "swipe")
    }

    /// Screen flick: from the center, a quarter of the short screen side
    /// split along the speed vector.
    pub async fn flick_screen(&self, x_speed: f64, y_speed: f64) -> Result<(), ActionError> {
        let speed = flick_speed(x_speed, y_speed)?;
        let rect = self.screen_rect().await?;
        let start = rect.center();
        let distance = f64::from(rect.width().min(rect.height())) / 4.0;
        let end = start.offset(distance * x_speed / speed, distance * y_speed / speed);
        self.swipe(start, end, flick_steps(speed)).await
    }

    /// Element flick: from the element's center by a pixel offset.
    pub async fn flick_element(
        &self,
        element: &dyn UiObject,
        x_offset: f64,
        y_offset: f64,
        speed: f64,
    ) -> Result<(), ActionError> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ActionError::InvalidArgument(format!(
                "flick speed {speed} must be positive"
            )));
        }
        let start = element.bounds().await?.center();
        let end = start.offset(x_offset, y_offset);
        self.swipe(start, end, flick_steps(speed)).await
    }
}

fn flick_speed(x_speed: f64, y_speed: f64) -> Result<f64, ActionError> {
    let speed = x_speed.hypot(y_speed);
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(ActionError::InvalidArgument(
            "flick needs a non-zero speed".to_string(),
        ))
    }
}

/// Saturates for very slow flicks; `swipe` then rejects the count.
fn flick_steps(speed: f64) -> u32 {
    ((FLICK_STEP_BASE / speed) as u32).saturating_add(1)
}

fn ensure(performed: bool, what: &str) -> Result<(), ActionError> {
    if performed {
        Ok(())
    } else {
        Err(ActionError::ActionFailed(format!("{what} did not complete")))
    }
}
