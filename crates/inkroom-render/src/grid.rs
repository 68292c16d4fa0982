//! Background grid, cached between frames.

use crate::renderer::GRID_PITCH;
use inkroom_core::view::ViewTransform;
use kurbo::{BezPath, Point, Size, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
struct GridKey {
    viewport: Size,
    pitch: f64,
    offset: Vec2,
}

/// Screen-space grid lines, rebuilt only when the viewport, zoom or pan
/// phase changes.
#[derive(Debug, Default)]
pub struct GridCache {
    key: Option<GridKey>,
    path: BezPath,
    rebuilds: usize,
}

impl GridCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid lines covering `viewport` for the given view, in screen pixels.
    ///
    /// Cells are `GRID_PITCH * scale` pixels wide, shifted by the negated pan
    /// wrapped into one cell.
    pub fn path(&mut self, viewport: Size, view: &ViewTransform) -> &BezPath {
        let pitch = GRID_PITCH * view.scale();
        let offset = Vec2::new(
            (-view.pan.x).rem_euclid(pitch),
            (-view.pan.y).rem_euclid(pitch),
        );
        let key = GridKey {
            viewport,
            pitch,
            offset,
        };
        if self.key != Some(key) {
            self.path = build_grid(key);
            self.key = Some(key);
            self.rebuilds += 1;
        }
        &self.path
    }

    /// How many times the grid was rebuilt.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Drop the cached grid.
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

fn build_grid(key: GridKey) -> BezPath {
    let mut path = BezPath::new();
    if key.pitch.is_nan() || key.pitch <= 0.0 {
        return path;
    }
    let Size { width, height } = key.viewport;

    let mut x = key.offset.x;
    while x < width {
        path.move_to(Point::new(x, 0.0));
        path.line_to(Point::new(x, height));
        x += key.pitch;
    }
    let mut y = key.offset.y;
    while y < height {
        path.move_to(Point::new(0.0, y));
        path.line_to(Point::new(width, y));
        y += key.pitch;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn line_starts(path: &BezPath) -> Vec<Point> {
        path.elements()
            .iter()
            .filter_map(|el| match el {
                PathEl::MoveTo(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_grid_lines_at_default_view() {
        let mut cache = GridCache::new();
        let path = cache.path(Size::new(100.0, 40.0), &ViewTransform::new());
        let starts = line_starts(path);
        // Five vertical lines (0..=80) and two horizontal (0, 20).
        assert_eq!(starts.len(), 7);
        assert_eq!(starts[1], Point::new(20.0, 0.0));
        assert_eq!(starts[5], Point::new(0.0, 0.0));
        assert_eq!(starts[6], Point::new(0.0, 20.0));
    }

    #[test]
    fn test_pitch_scales_with_zoom() {
        let mut cache = GridCache::new();
        let mut view = ViewTransform::new();
        view.set_scale(2.0);
        let starts = line_starts(cache.path(Size::new(100.0, 10.0), &view));
        assert_eq!(starts[1], Point::new(40.0, 0.0));
    }

    #[test]
    fn test_offset_wraps_pan() {
        let mut cache = GridCache::new();
        let mut view = ViewTransform::new();
        view.pan = Vec2::new(25.0, -3.0);
        let starts = line_starts(cache.path(Size::new(50.0, 50.0), &view));
        assert_eq!(starts[0], Point::new(15.0, 0.0));
        assert!(starts.contains(&Point::new(0.0, 3.0)));
    }

    #[test]
    fn test_cache_reuses_until_view_changes() {
        let mut cache = GridCache::new();
        let mut view = ViewTransform::new();
        let size = Size::new(200.0, 200.0);
        cache.path(size, &view);
        cache.path(size, &view);
        assert_eq!(cache.rebuilds(), 1);

        // A full-cell pan leaves the pattern unchanged.
        view.pan = Vec2::new(20.0, 40.0);
        cache.path(size, &view);
        assert_eq!(cache.rebuilds(), 1);

        view.set_scale(1.5);
        cache.path(size, &view);
        assert_eq!(cache.rebuilds(), 2);

        cache.invalidate();
        cache.path(size, &view);
        assert_eq!(cache.rebuilds(), 3);
    }
}
