//! Drawing surface seam between the session and a rendering backend.

use crate::selection::Selection;
use crate::shapes::{Shape, ShapeId};
use crate::sync::ShapeRecord;
use crate::tools::Preview;
use crate::view::ViewTransform;
use kurbo::{Rect, Size};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised by a drawing surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Drawing context unavailable: {0}")]
    Unavailable(String),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub shapes: &'a [Shape],
    pub view: ViewTransform,
    pub selection: &'a Selection,
    /// Marquee rectangle in model space.
    pub marquee: Option<Rect>,
    pub preview: Option<Preview>,
    pub viewport: Size,
}

impl Frame<'_> {
    /// Selected shapes in z-order.
    pub fn selected_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| self.selection.contains(s.id()))
    }
}

/// A target the session draws into.
pub trait Surface {
    /// Bind to a viewport of `size` screen pixels. Called on session entry and resize.
    fn attach(&mut self, size: Size) -> Result<(), SurfaceError>;

    /// Repaint from scratch.
    fn redraw(&mut self, frame: &Frame<'_>);

    /// Encode the committed shapes as a standalone image.
    fn export(&mut self, shapes: &[Shape]) -> Result<Vec<u8>, SurfaceError>;
}

/// Summary of the last frame a [`HeadlessSurface`] received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSummary {
    pub shape_count: usize,
    pub selected: Vec<ShapeId>,
    pub marquee: Option<Rect>,
    pub has_preview: bool,
    pub scale: f64,
}

#[derive(Debug, Default)]
struct HeadlessState {
    available: bool,
    viewport: Option<Size>,
    redraws: usize,
    last_frame: Option<FrameSummary>,
}

/// Surface without a display. Records frames and exports shapes as JSON records.
///
/// Clones share state so a test can inspect frames after handing one to a session.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    state: Rc<RefCell<HeadlessState>>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                available: true,
                ..HeadlessState::default()
            })),
        }
    }

    /// A surface whose drawing context never becomes available.
    pub fn unavailable() -> Self {
        let surface = Self::new();
        surface.state.borrow_mut().available = false;
        surface
    }

    pub fn redraw_count(&self) -> usize {
        self.state.borrow().redraws
    }

    pub fn viewport(&self) -> Option<Size> {
        self.state.borrow().viewport
    }

    pub fn last_frame(&self) -> Option<FrameSummary> {
        self.state.borrow().last_frame.clone()
    }
}

impl Surface for HeadlessSurface {
    fn attach(&mut self, size: Size) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return Err(SurfaceError::Unavailable("headless surface disabled".into()));
        }
        state.viewport = Some(size);
        Ok(())
    }

    fn redraw(&mut self, frame: &Frame<'_>) {
        let mut state = self.state.borrow_mut();
        state.redraws += 1;
        state.last_frame = Some(FrameSummary {
            shape_count: frame.shapes.len(),
            selected: frame.selected_shapes().map(|s| s.id().clone()).collect(),
            marquee: frame.marquee,
            has_preview: frame.preview.is_some(),
            scale: frame.view.scale(),
        });
    }

    fn export(&mut self, shapes: &[Shape]) -> Result<Vec<u8>, SurfaceError> {
        let records: Vec<ShapeRecord> = shapes.iter().map(ShapeRecord::from_shape).collect();
        serde_json::to_vec(&records).map_err(|e| SurfaceError::Export(e.to_string()))
    }
}
