//! Logical coordinates to screen pixels.

use uiauto_core_types::{Point, Rect};

use crate::errors::ActionError;
use crate::types::Position;

/// One axis: `0` is the middle, `(0, 1)` in magnitude is a fraction of
/// `length`, anything else is taken as pixels. `offset` is always added.
pub fn translate_coordinate(value: f64, length: f64, offset: f64) -> f64 {
    let translated = if value == 0.0 {
        length * 0.5
    } else if value.abs() < 1.0 {
        length * value
    } else {
        value
    };
    translated + offset
}

/// Resolves `position` against `area`. With `check_bounds`, a result that
/// falls outside `area` is rejected.
pub fn resolve_point(position: Position, area: Rect, check_bounds: bool) -> Result<Point, ActionError> {
    let point = Point::new(
        translate_coordinate(position.x, f64::from(area.width()), f64::from(area.left)),
        translate_coordinate(position.y, f64::from(area.height()), f64::from(area.top)),
    );
    if check_bounds && !within(area, point) {
        return Err(ActionError::InvalidCoordinates(format!(
            "Coordinate [x={}, y={}] is outside of element rect: [{}, {}][{}, {}]",
            point.x, point.y, area.left, area.top, area.right, area.bottom
        )));
    }
    Ok(point)
}

fn within(area: Rect, point: Point) -> bool {
    point.x >= f64::from(area.left)
        && point.x <= f64::from(area.right)
        && point.y >= f64::from(area.top)
        && point.y <= f64::from(area.bottom)
}
