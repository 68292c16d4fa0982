//! Ellipse shape.

use super::ShapeGeometry;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point,
    /// Horizontal radius, never negative.
    pub radius_x: f64,
    /// Vertical radius, never negative.
    pub radius_y: f64,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            center,
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
        }
    }

    /// Ellipse inscribed in the box dragged from `anchor` to `current`.
    pub fn from_drag(anchor: Point, current: Point) -> Self {
        let half = (current - anchor) / 2.0;
        Self::new(anchor + half, half.x, half.y)
    }
}

impl ShapeGeometry for Ellipse {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rx = self.radius_x + tolerance;
        let ry = self.radius_y + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;
        (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry) <= 1.0
    }

    fn to_path(&self) -> BezPath {
        kurbo::Ellipse::new(self.center, (self.radius_x, self.radius_y), 0.0).to_path(0.1)
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }
}
