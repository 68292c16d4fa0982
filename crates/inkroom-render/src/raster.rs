//! CPU export to PNG.
//!
//! Shapes are painted with tiny-skia into a premultiplied pixmap, then handed
//! to the PNG encoder as straight RGBA.

use crate::renderer::{RenderResult, RendererError};
use image::RgbaImage;
use inkroom_core::geometry::union_bounds;
use inkroom_core::shapes::{SerializableColor, Shape};
use kurbo::{Affine, BezPath, PathEl};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Blank space around the content, in model units.
pub const EXPORT_PADDING: f64 = 20.0;
/// Exports are never narrower than this.
pub const MIN_EXPORT_WIDTH: u32 = 800;
/// Exports are never shorter than this.
pub const MIN_EXPORT_HEIGHT: u32 = 600;
/// Larger content is scaled down to fit.
pub const MAX_EXPORT_DIMENSION: u32 = 8192;

/// Output size and the model-to-pixel transform for an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportLayout {
    pub width: u32,
    pub height: u32,
    pub transform: Affine,
}

impl ExportLayout {
    /// Place the union bounds of `shapes` at the top-left, inside the padding.
    pub fn for_shapes(shapes: &[Shape]) -> Self {
        let Some(bounds) = union_bounds(shapes) else {
            return Self {
                width: MIN_EXPORT_WIDTH,
                height: MIN_EXPORT_HEIGHT,
                transform: Affine::IDENTITY,
            };
        };
        let width = (bounds.width() + EXPORT_PADDING * 2.0).max(f64::from(MIN_EXPORT_WIDTH));
        let height = (bounds.height() + EXPORT_PADDING * 2.0).max(f64::from(MIN_EXPORT_HEIGHT));
        let scale = (f64::from(MAX_EXPORT_DIMENSION) / width.max(height)).min(1.0);
        if scale < 1.0 {
            log::warn!(
                "Export of {:.0}x{:.0} exceeds {}px, scaling by {:.3}",
                width,
                height,
                MAX_EXPORT_DIMENSION,
                scale
            );
        }

        Self {
            width: ((width * scale).ceil() as u32).clamp(1, MAX_EXPORT_DIMENSION),
            height: ((height * scale).ceil() as u32).clamp(1, MAX_EXPORT_DIMENSION),
            transform: Affine::scale(scale)
                * Affine::translate((EXPORT_PADDING - bounds.x0, EXPORT_PADDING - bounds.y0)),
        }
    }
}

/// Paint `shapes` in order onto a white image.
pub fn rasterize(shapes: &[Shape]) -> RenderResult<RgbaImage> {
    let layout = ExportLayout::for_shapes(shapes);
    let mut pixmap = Pixmap::new(layout.width, layout.height).ok_or_else(|| {
        RendererError::RenderFailed(format!(
            "cannot allocate {}x{} pixmap",
            layout.width, layout.height
        ))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let transform = skia_transform(layout.transform);

    for shape in shapes {
        let Some(path) = skia_path(&shape.to_path()) else {
            log::debug!("Skipping degenerate shape {} in export", shape.id());
            continue;
        };
        if let Some(fill) = shape.style.fill_color {
            pixmap.fill_path(&path, &paint(fill), FillRule::Winding, transform, None);
        }
        let stroke = tiny_skia::Stroke {
            width: f32::from(shape.style.stroke_width),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(shape.style.stroke_color), &stroke, transform, None);
    }

    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(layout.width, layout.height, data)
        .ok_or_else(|| RendererError::RenderFailed("pixmap size mismatch".to_string()))
}

/// Rasterize `shapes` and encode the result as PNG.
pub fn export_png(shapes: &[Shape]) -> RenderResult<Vec<u8>> {
    let image = rasterize(shapes)?;
    encode_png(&image)
}

fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| RendererError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

fn paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint
}

fn skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// Convert a kurbo path. Returns `None` for paths with no extent.
fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::CurveTo(p1, p2, p) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
