//! Geometry queries over committed shapes.

use crate::shapes::{Shape, ShapeGeometry};
use kurbo::{Point, Rect};

/// Smallest hit tolerance, in model units.
pub const MIN_HIT_TOLERANCE: f64 = 5.0;

/// Hit tolerance for a shape drawn at `stroke_width`.
pub fn tolerance_for(stroke_width: u8) -> f64 {
    (f64::from(stroke_width) * 2.0).max(MIN_HIT_TOLERANCE)
}

/// Axis-aligned bounding box of a shape in model space.
pub fn bounds_of(shape: &Shape) -> Rect {
    shape.bounds()
}

/// Whether `point` (model space) lands on `shape`.
pub fn hit_test(point: Point, shape: &Shape) -> bool {
    shape
        .geometry()
        .hit_test(point, tolerance_for(shape.style.stroke_width))
}

/// Whether `bounds` lies entirely inside `region`, edges included.
///
/// `region` may have negative extents; it is normalized first.
pub fn contained_by(bounds: Rect, region: Rect) -> bool {
    let region = region.abs();
    bounds.x0 >= region.x0
        && bounds.x1 <= region.x1
        && bounds.y0 >= region.y0
        && bounds.y1 <= region.y1
}

/// Union of the bounds of every shape, or `None` when empty.
pub fn union_bounds<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Option<Rect> {
    shapes
        .into_iter()
        .map(bounds_of)
        .reduce(|acc, b| acc.union(b))
}

/// Point-in-rect test that includes every edge.
pub fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Perpendicular distance from `point` to the infinite line through `a` and `b`.
///
/// Falls back to the distance to `a` when the two points coincide.
pub fn distance_to_line(point: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len = ab.hypot();
    if len == 0.0 {
        return point.distance(a);
    }
    (ab.cross(point - a)).abs() / len
}
