//! Tool system for the shared canvas.

use crate::shapes::{
    Ellipse, Geometry, Line, Rectangle, ShapeId, ShapeStyle, SerializableColor,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Drags shorter than this in every dimension are discarded on release.
pub const MIN_SHAPE_EXTENT: f64 = 2.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Ellipse,
    Line,
    Freehand,
    Eraser,
    Hand,
}

impl ToolKind {
    /// CSS-style cursor name shown while the tool is active.
    pub fn cursor(&self) -> &'static str {
        match self {
            ToolKind::Select => "default",
            ToolKind::Hand => "grab",
            ToolKind::Rectangle
            | ToolKind::Ellipse
            | ToolKind::Line
            | ToolKind::Freehand
            | ToolKind::Eraser => "crosshair",
        }
    }

    /// Tools that commit a shape from a press-drag-release.
    pub fn is_drag_shape(&self) -> bool {
        matches!(self, ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Line)
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    /// Waiting for a press.
    #[default]
    Idle,
    /// Dragging out a rectangle, ellipse or line in model space.
    Drawing { anchor: Point, current: Point },
    /// A freehand stroke is growing inside the store.
    Sketching { shape_id: ShapeId },
    /// Eraser held down.
    Erasing,
    /// Hand tool dragging the view; `last` is in screen space.
    Panning { last: Point },
    /// Select tool gesture in progress.
    Selecting,
}

/// Uncommitted shape shown while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub geometry: Geometry,
    pub style: ShapeStyle,
}

/// Geometry a drag from `anchor` to `current` produces with `tool`.
pub fn drag_geometry(tool: ToolKind, anchor: Point, current: Point) -> Option<Geometry> {
    match tool {
        ToolKind::Rectangle => Some(Geometry::Rectangle(Rectangle::from_drag(anchor, current))),
        ToolKind::Ellipse => Some(Geometry::Ellipse(Ellipse::from_drag(anchor, current))),
        ToolKind::Line => Some(Geometry::Line(Line::new(anchor, current))),
        _ => None,
    }
}

/// Whether a drag is large enough to become a shape.
pub fn exceeds_threshold(tool: ToolKind, anchor: Point, end: Point) -> bool {
    match tool {
        ToolKind::Line => anchor.distance(end) >= MIN_SHAPE_EXTENT,
        _ => {
            (end.x - anchor.x).abs() >= MIN_SHAPE_EXTENT
                || (end.y - anchor.y).abs() >= MIN_SHAPE_EXTENT
        }
    }
}

/// Manages the current tool, its interaction state and the style for new shapes.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools, returning whatever interaction was in progress.
    pub fn set_tool(&mut self, tool: ToolKind) -> ToolState {
        self.current_tool = tool;
        std::mem::take(&mut self.state)
    }

    /// Abandon the current interaction.
    pub fn cancel(&mut self) -> ToolState {
        std::mem::take(&mut self.state)
    }

    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.current_style.stroke_width = ShapeStyle::clamp_stroke_width(width);
    }

    pub fn set_stroke_color(&mut self, color: SerializableColor) {
        self.current_style.stroke_color = color;
    }

    /// `None` leaves new shapes unfilled.
    pub fn set_fill_color(&mut self, color: Option<SerializableColor>) {
        self.current_style.fill_color = color;
    }

    /// Start a drag for the rectangle, ellipse or line tool.
    pub fn begin_drag(&mut self, anchor: Point) {
        if self.current_tool.is_drag_shape() {
            self.state = ToolState::Drawing {
                anchor,
                current: anchor,
            };
        }
    }

    /// Track the pointer during a drag. Returns whether the preview moved.
    pub fn update_drag(&mut self, point: Point) -> bool {
        match &mut self.state {
            ToolState::Drawing { current, .. } if *current != point => {
                *current = point;
                true
            }
            _ => false,
        }
    }

    /// Finish a drag, yielding the geometry to commit if it is big enough.
    pub fn finish_drag(&mut self, end: Point) -> Option<Geometry> {
        let ToolState::Drawing { anchor, .. } = self.state else {
            return None;
        };
        self.state = ToolState::Idle;
        if !exceeds_threshold(self.current_tool, anchor, end) {
            log::debug!("Discarding {:?} drag below threshold", self.current_tool);
            return None;
        }
        drag_geometry(self.current_tool, anchor, end)
    }

    /// Shape that would be committed if the drag ended now.
    pub fn preview(&self) -> Option<Preview> {
        match self.state {
            ToolState::Drawing { anchor, current } => {
                drag_geometry(self.current_tool, anchor, current).map(|geometry| Preview {
                    geometry,
                    style: self.current_style.clone(),
                })
            }
            _ => None,
        }
    }
}
