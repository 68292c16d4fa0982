//! Pan/zoom view transform between screen and model space.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 5.0;
/// Multiplier applied by a single zoom-in or zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;
/// Screen padding kept around content when fitting it into view.
pub const FIT_PADDING: f64 = 50.0;
/// Fitting never magnifies beyond this scale.
pub const FIT_MAX_SCALE: f64 = 2.0;

/// Zoom factor for a wheel movement of `delta_y` screen units.
pub fn wheel_zoom_factor(delta_y: f64) -> f64 {
    (1.0 - delta_y / 1000.0).max(0.01)
}

/// Maps model coordinates to screen coordinates as `screen = model * scale + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Screen-space translation.
    pub pan: Vec2,
    scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the scale directly, clamped to the allowed range. Pan is left alone.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    /// Model-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.scale)
    }

    /// Convert a screen point to model coordinates.
    pub fn to_model_space(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.scale,
            (screen.y - self.pan.y) / self.scale,
        )
    }

    /// Convert a model point to screen coordinates.
    pub fn to_screen_space(&self, model: Point) -> Point {
        Point::new(
            model.x * self.scale + self.pan.x,
            model.y * self.scale + self.pan.y,
        )
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom by `factor`, keeping the model point under `screen` fixed.
    ///
    /// Returns whether the scale changed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let anchor = self.to_model_space(screen);
        self.scale = new_scale;
        self.pan = Vec2::new(
            screen.x - anchor.x * new_scale,
            screen.y - anchor.y * new_scale,
        );
        true
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale / ZOOM_STEP);
    }

    /// Set the scale from a percentage, e.g. `150` for 1.5x.
    pub fn set_zoom_percent(&mut self, percent: f64) {
        self.set_scale(percent / 100.0);
    }

    /// Current scale as a rounded percentage.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Back to scale 1 with no pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Center `bounds` in `viewport` with padding, never magnifying past 2x.
    pub fn fit_to_content(&mut self, bounds: Rect, viewport: Size) {
        let available = Size::new(
            (viewport.width - FIT_PADDING * 2.0).max(1.0),
            (viewport.height - FIT_PADDING * 2.0).max(1.0),
        );
        let fit = |space: f64, extent: f64| {
            if extent > 0.0 {
                space / extent
            } else {
                f64::INFINITY
            }
        };
        let scale = fit(available.width, bounds.width())
            .min(fit(available.height, bounds.height()))
            .min(FIT_MAX_SCALE)
            .clamp(MIN_SCALE, MAX_SCALE);

        self.scale = scale;
        self.pan = Vec2::new(
            (viewport.width - bounds.width() * scale) / 2.0 - bounds.x0 * scale,
            (viewport.height - bounds.height() * scale) / 2.0 - bounds.y0 * scale,
        );
    }
}
