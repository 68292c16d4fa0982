//! Renderer trait abstraction.

use inkroom_core::surface::Frame;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Model-space spacing of the background grid.
pub const GRID_PITCH: f64 = 20.0;
/// Grid line colour (#e0e0e0).
pub const GRID_COLOR: Color = Color::from_rgba8(0xe0, 0xe0, 0xe0, 0xff);
/// Selection halo and marquee colour (#007bff).
pub const SELECTION_COLOR: Color = Color::from_rgba8(0x00, 0x7b, 0xff, 0xff);
/// Marquee interior, the selection colour at 10% opacity.
pub const MARQUEE_FILL: Color = Color::from_rgba8(0x00, 0x7b, 0xff, 26);
/// Gap between a selected shape's bounds and its halo, in model units.
pub const HALO_INFLATE: f64 = 5.0;
/// Halo stroke width in screen pixels.
pub const HALO_WIDTH: f64 = 2.0;
/// Marquee outline width in screen pixels.
pub const MARQUEE_WIDTH: f64 = 1.0;
/// On/off dash length for halos, previews and the marquee, in screen pixels.
pub const DASH_LENGTH: f64 = 5.0;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Session state to draw.
    pub frame: &'a Frame<'a>,
    /// Background color.
    pub background_color: Color,
    /// Whether to paint the background grid.
    pub show_grid: bool,
    /// Selection highlight color.
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(frame: &'a Frame<'a>) -> Self {
        Self {
            frame,
            background_color: Color::WHITE,
            show_grid: true,
            selection_color: SELECTION_COLOR,
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Toggle the background grid.
    pub fn with_grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    /// Set the selection highlight color.
    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the drawing commands for one frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
