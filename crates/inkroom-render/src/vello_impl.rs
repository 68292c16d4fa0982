//! Vello-based renderer implementation.

use crate::grid::GridCache;
use crate::raster;
use crate::renderer::{
    DASH_LENGTH, GRID_COLOR, HALO_INFLATE, HALO_WIDTH, MARQUEE_FILL, MARQUEE_WIDTH,
    RenderContext, Renderer,
};
use inkroom_core::shapes::{Shape, ShapeStyle};
use inkroom_core::surface::{Frame, Surface, SurfaceError};
use inkroom_core::tools::Preview;
use kurbo::{Affine, BezPath, Rect, Shape as KurboShape, Size, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
///
/// Builds a [`Scene`] per frame; presenting it is up to the host.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Cached background grid.
    grid: GridCache,
    /// Viewport bound by the last successful attach.
    viewport: Option<Size>,
    /// Current zoom, for widths that stay constant on screen.
    zoom: f64,
    /// Selection highlight color.
    selection_color: Color,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            grid: GridCache::new(),
            viewport: None,
            zoom: 1.0,
            selection_color: crate::renderer::SELECTION_COLOR,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    pub fn grid(&self) -> &GridCache {
        &self.grid
    }

    /// Render a shape path with the given style.
    fn render_path(&mut self, path: &BezPath, style: &ShapeStyle, transform: Affine, dashed: bool) {
        if let Some(fill_color) = style.fill() {
            self.scene
                .fill(Fill::NonZero, transform, fill_color, None, path);
        }

        let mut stroke = Stroke::new(f64::from(style.stroke_width));
        if dashed {
            let dash = DASH_LENGTH / self.zoom;
            stroke = stroke.with_dashes(0.0, [dash, dash]);
        }
        self.scene.stroke(&stroke, transform, style.stroke(), None, path);
    }

    fn render_preview(&mut self, preview: &Preview, transform: Affine) {
        use inkroom_core::shapes::ShapeGeometry;
        let path = preview.geometry.to_path();
        self.render_path(&path, &preview.style, transform, true);
    }

    /// Dashed box around a selected shape.
    fn render_halo(&mut self, bounds: Rect, transform: Affine) {
        let halo = bounds.inflate(HALO_INFLATE, HALO_INFLATE);
        let dash = DASH_LENGTH / self.zoom;
        let stroke = Stroke::new(HALO_WIDTH / self.zoom).with_dashes(0.0, [dash, dash]);
        self.scene
            .stroke(&stroke, transform, self.selection_color, None, &halo);
    }

    /// Render a selection rectangle (marquee).
    /// Stroke width and dash pattern are scaled inversely with zoom.
    fn render_selection_rect(&mut self, rect: Rect, transform: Affine) {
        let path = rect.to_path(0.1);
        self.scene
            .fill(Fill::NonZero, transform, MARQUEE_FILL, None, &path);

        let dash = DASH_LENGTH / self.zoom;
        let stroke = Stroke::new(MARQUEE_WIDTH / self.zoom).with_dashes(0.0, [dash, dash]);
        self.scene
            .stroke(&stroke, transform, self.selection_color, None, &path);
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        let frame = ctx.frame;
        self.scene.reset();
        self.selection_color = ctx.selection_color;
        self.zoom = frame.view.scale();

        let background = self.background_color(ctx);
        let viewport = Rect::from_origin_size((0.0, 0.0), frame.viewport);
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, background, None, &viewport);

        // Grid lives in screen space.
        if ctx.show_grid {
            let grid = self.grid.path(frame.viewport, &frame.view);
            self.scene
                .stroke(&Stroke::new(1.0), Affine::IDENTITY, GRID_COLOR, None, grid);
        }

        let transform = frame.view.transform();
        for shape in frame.shapes {
            self.render_path(&shape.to_path(), &shape.style, transform, false);
        }
        for shape in frame.selected_shapes() {
            self.render_halo(shape.bounds(), transform);
        }
        if let Some(preview) = &frame.preview {
            self.render_preview(preview, transform);
        }

        // Marquee goes on top of everything.
        if let Some(rect) = frame.marquee {
            self.render_selection_rect(rect, transform);
        }
    }
}

impl Surface for VelloRenderer {
    fn attach(&mut self, size: Size) -> Result<(), SurfaceError> {
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return Err(SurfaceError::Unavailable(format!(
                "viewport {}x{} is not drawable",
                size.width, size.height
            )));
        }
        log::debug!("Vello surface attached at {}x{}", size.width, size.height);
        self.viewport = Some(size);
        self.grid.invalidate();
        Ok(())
    }

    fn redraw(&mut self, frame: &Frame<'_>) {
        let ctx = RenderContext::new(frame);
        self.build_scene(&ctx);
    }

    fn export(&mut self, shapes: &[Shape]) -> Result<Vec<u8>, SurfaceError> {
        raster::export_png(shapes).map_err(|e| SurfaceError::Export(e.to_string()))
    }
}
