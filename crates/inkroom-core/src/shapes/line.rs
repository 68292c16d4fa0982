//! Straight line segment.

use super::ShapeGeometry;
use crate::geometry::{contains_inclusive, distance_to_line};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A segment between two explicit endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl ShapeGeometry for Line {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        // A degenerate segment behaves like a dot at its start.
        if self.length() == 0.0 {
            return point.distance(self.start) <= tolerance;
        }
        distance_to_line(point, self.start, self.end) <= tolerance
            && contains_inclusive(self.bounds().inflate(tolerance, tolerance), point)
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }
}
