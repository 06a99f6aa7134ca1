//! Shared primitives for the uiauto device agent crates.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod selector;

pub use selector::{NodeFlag, SelectorAttr, UiSelector};

/// Stable handle the agent hands out for a discovered UI node.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementKey(pub String);

impl ElementKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Screen coordinate in pixels. Fractional values are allowed while a
/// gesture is being planned; the device rounds at injection time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle, edges in pixels (right/bottom exclusive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> Point {
        Point::new(
            f64::from(self.left) + f64::from(self.width()) / 2.0,
            f64::from(self.top) + f64::from(self.height()) / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= f64::from(self.left)
            && point.x < f64::from(self.right)
            && point.y >= f64::from(self.top)
            && point.y < f64::from(self.bottom)
    }

    /// Overlap of two rectangles; empty when they do not intersect.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let rect = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if rect.is_empty() {
            Rect::default()
        } else {
            rect
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Display rotation as reported by the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "PORTRAIT" => Some(Self::Portrait),
            "LANDSCAPE" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "PORTRAIT",
            Self::Landscape => "LANDSCAPE",
        }
    }
}

/// Frame-synchronized pointer positions: one row per finger, every row the
/// same length, emitted one column per `frame_interval`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerFrames {
    pub pointers: Vec<Vec<Point>>,
    pub frame_interval: Duration,
}

impl PointerFrames {
    pub fn new(pointers: Vec<Vec<Point>>, frame_interval: Duration) -> Self {
        Self {
            pointers,
            frame_interval,
        }
    }

    pub fn finger_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn frame_count(&self) -> usize {
        self.pointers.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Time offset of the last emitted frame.
    pub fn duration(&self) -> Duration {
        let frames = self.frame_count();
        if frames == 0 {
            return Duration::ZERO;
        }
        self.frame_interval * (frames as u32 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_center_and_contains() {
        let rect = Rect::new(10, 20, 110, 220);
        assert_eq!(rect.center(), Point::new(60.0, 120.0));
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(!rect.contains(Point::new(110.0, 50.0)));
        assert_eq!(rect.size(), Size::new(100, 200));
    }

    #[test]
    fn disjoint_rects_intersect_to_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.intersect(&Rect::new(5, 5, 50, 50)), Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn element_key_serializes_as_plain_string() {
        let key = ElementKey::from("7");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"7\"");
    }

    #[test]
    fn frame_duration_counts_intervals() {
        let frames = PointerFrames::new(
            vec![vec![Point::default(); 4]],
            Duration::from_millis(5),
        );
        assert_eq!(frames.frame_count(), 4);
        assert_eq!(frames.duration(), Duration::from_millis(15));
    }
}
